use crate::{
    Config,
    model::{ChecklistItem, CoordsMap, ReportEntry},
    resolver::{
        lookup::{LocalLookupResolver, PincodeTable},
        remote::RemoteGeocodeResolver,
    },
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod lookup;
pub mod pacing;
pub mod remote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverId {
    LocalLookup,
    RemoteGeocode,
}

impl ResolverId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverId::LocalLookup => "lookup",
            ResolverId::RemoteGeocode => "remote",
        }
    }

    pub const fn all() -> &'static [ResolverId] {
        &[ResolverId::LocalLookup, ResolverId::RemoteGeocode]
    }
}

impl std::fmt::Display for ResolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResolverId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "lookup" => Ok(ResolverId::LocalLookup),
            "remote" => Ok(ResolverId::RemoteGeocode),
            _ => Err(anyhow::anyhow!(
                "Unknown resolver '{value}'. Supported resolvers: lookup, remote."
            )),
        }
    }
}

/// Everything one run produces: the coordinate map plus the fallback report.
///
/// The two strategies fill it differently and are never merged: the lookup
/// strategy appends one report entry per substituted pincode, while the
/// remote strategy leaves the report empty and surfaces its misses only in
/// the log stream.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub coords: CoordsMap,
    pub report: Vec<ReportEntry>,
}

#[async_trait]
pub trait CoordinateResolver: Send + Sync + Debug {
    async fn resolve(&self, checklist: &[ChecklistItem]) -> anyhow::Result<Resolution>;
}

/// Construct a resolver from config and explicit ResolverId.
///
/// The lookup strategy needs its pincode table; the remote strategy needs a
/// configured API key.
pub fn resolver_from_config(
    id: ResolverId,
    config: &Config,
    table: Option<PincodeTable>,
) -> anyhow::Result<Box<dyn CoordinateResolver>> {
    let boxed: Box<dyn CoordinateResolver> = match id {
        ResolverId::LocalLookup => {
            let table = table.ok_or_else(|| {
                anyhow::anyhow!(
                    "The lookup resolver needs a pincode table.\n\
                     Hint: pass `--table <csv>` with pincode, latitude and longitude columns."
                )
            })?;
            Box::new(LocalLookupResolver::new(table, config.fallback.coords()))
        }
        ResolverId::RemoteGeocode => Box::new(RemoteGeocodeResolver::from_config(config)?),
    };

    Ok(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn resolver_id_as_str_roundtrip() {
        for id in ResolverId::all() {
            let s = id.as_str();
            let parsed = ResolverId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_resolver_error() {
        let err = ResolverId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown resolver"));
    }

    #[test]
    fn lookup_resolver_requires_a_table() {
        let cfg = Config::default();
        let err = resolver_from_config(ResolverId::LocalLookup, &cfg, None).unwrap_err();
        assert!(err.to_string().contains("needs a pincode table"));
    }

    #[test]
    fn remote_resolver_requires_an_api_key() {
        let cfg = Config::default();
        let err = resolver_from_config(ResolverId::RemoteGeocode, &cfg, None).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn resolver_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.upsert_resolver_api_key(ResolverId::RemoteGeocode, "KEY".to_string());

        assert!(resolver_from_config(ResolverId::RemoteGeocode, &cfg, None).is_ok());
        assert!(
            resolver_from_config(ResolverId::LocalLookup, &cfg, Some(PincodeTable::default()))
                .is_ok()
        );
    }
}
