use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::Config;
use crate::model::{ChecklistItem, CoordinateEntry, CoordsMap};
use crate::resolver::{CoordinateResolver, Resolution, ResolverId, pacing::IntervalGate};

/// Outcome of a single geocoding query. `NoResults` and `Status` are
/// skippable; `Transport` and `Parse` end the run.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("geocoding returned no results")]
    NoResults,

    #[error("failed to reach geocoding service")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse geocoding response JSON")]
    Parse(#[source] serde_json::Error),
}

/// Resolves coordinates by querying a remote geocoding service, one query
/// per checklist item, paced by a fixed interval. Pincodes the service
/// cannot resolve are omitted from the output entirely; there is no
/// fallback substitution in this strategy.
#[derive(Debug, Clone)]
pub struct RemoteGeocodeResolver {
    api_key: String,
    endpoint: String,
    countrycode: String,
    request_interval: Duration,
    http: Client,
}

impl RemoteGeocodeResolver {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.resolver_api_key(ResolverId::RemoteGeocode).ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured for the remote resolver.\n\
                 Hint: run `pincoords configure remote` and enter your API key."
            )
        })?;

        Ok(Self {
            api_key: api_key.to_owned(),
            endpoint: config.geocoding.endpoint.clone(),
            countrycode: config.geocoding.countrycode.clone(),
            request_interval: config.geocoding.request_interval(),
            http: Client::new(),
        })
    }

    /// Point the resolver at a different service base, e.g. a local test
    /// server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn geocode_once(&self, pincode: &str) -> Result<CoordinateEntry, GeocodeError> {
        let url = format!("{}/geocode/v1/json", self.endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", pincode),
                ("key", self.api_key.as_str()),
                ("countrycode", self.countrycode.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        interpret_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct GcGeometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GcResult {
    geometry: GcGeometry,
}

#[derive(Debug, Deserialize)]
struct GcResponse {
    results: Vec<GcResult>,
}

fn interpret_response(status: StatusCode, body: &str) -> Result<CoordinateEntry, GeocodeError> {
    if !status.is_success() {
        return Err(GeocodeError::Status { status, body: truncate_body(body) });
    }

    let parsed: GcResponse = serde_json::from_str(body).map_err(GeocodeError::Parse)?;

    let first = parsed.results.first().ok_or(GeocodeError::NoResults)?;
    Ok(CoordinateEntry(first.geometry.lat, first.geometry.lng))
}

/// Record one query outcome. Misses are logged and skipped, never retried;
/// transport and parse failures end the run.
fn apply_outcome(
    coords: &mut CoordsMap,
    pincode: &str,
    outcome: Result<CoordinateEntry, GeocodeError>,
) -> Result<()> {
    match outcome {
        Ok(entry) => {
            tracing::info!(pincode, lat = entry.lat(), lon = entry.lon(), "resolved");
            coords.insert(pincode.to_string(), entry);
        }
        Err(GeocodeError::NoResults) => {
            tracing::warn!(pincode, "no results");
        }
        Err(GeocodeError::Status { status, .. }) => {
            tracing::warn!(pincode, %status, "error response");
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Geocoding query for pincode {pincode} could not be completed")
            });
        }
    }

    Ok(())
}

#[async_trait]
impl CoordinateResolver for RemoteGeocodeResolver {
    async fn resolve(&self, checklist: &[ChecklistItem]) -> Result<Resolution> {
        let mut coords = CoordsMap::new();
        let mut gate = IntervalGate::new(self.request_interval);

        for item in checklist {
            gate.wait().await;

            let outcome = self.geocode_once(&item.pincode).await;
            apply_outcome(&mut coords, &item.pincode, outcome)?;
        }

        Ok(Resolution { coords, report: Vec::new() })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_wins() {
        let body = r#"{
            "results": [
                {"geometry": {"lat": 28.6, "lng": 77.2}},
                {"geometry": {"lat": 1.0, "lng": 2.0}}
            ]
        }"#;

        let entry = interpret_response(StatusCode::OK, body).expect("should resolve");
        assert_eq!(entry, CoordinateEntry(28.6, 77.2));
    }

    #[test]
    fn zero_candidates_is_no_results() {
        let outcome = interpret_response(StatusCode::OK, r#"{"results": []}"#);
        assert!(matches!(outcome, Err(GeocodeError::NoResults)));
    }

    #[test]
    fn non_success_status_carries_the_status() {
        let outcome = interpret_response(StatusCode::PAYMENT_REQUIRED, "quota exceeded");

        match outcome {
            Err(GeocodeError::Status { status, body }) => {
                assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let outcome = interpret_response(StatusCode::BAD_GATEWAY, &body);

        match outcome {
            Err(GeocodeError::Status { body, .. }) => {
                assert!(body.ends_with("..."));
                assert_eq!(body.len(), 203);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_pincodes_stay_out_of_the_map() {
        let mut coords = CoordsMap::new();

        apply_outcome(&mut coords, "110001", Ok(CoordinateEntry(28.6, 77.2)))
            .expect("hit should record");
        apply_outcome(&mut coords, "999999", Err(GeocodeError::NoResults))
            .expect("miss should skip");
        apply_outcome(
            &mut coords,
            "888888",
            Err(GeocodeError::Status { status: StatusCode::FORBIDDEN, body: String::new() }),
        )
        .expect("error response should skip");

        assert_eq!(coords.len(), 1);
        assert!(coords.contains("110001"));
        assert!(!coords.contains("999999"));
        assert!(!coords.contains("888888"));
    }

    #[test]
    fn parse_failures_end_the_run() {
        let mut coords = CoordsMap::new();
        let parse_err = serde_json::from_str::<GcResponse>("not json").unwrap_err();

        let result = apply_outcome(&mut coords, "110001", Err(GeocodeError::Parse(parse_err)));

        assert!(result.is_err());
        assert!(coords.is_empty());
    }
}
