use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};

use pincoords_core::{
    Config, PincodeTable, ResolverId, emit, load_checklist, resolver_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "pincoords", version, about = "Pincode coordinate enrichment CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a resolver and make it the default.
    Configure {
        /// Resolver short name, e.g. "lookup" or "remote".
        resolver: String,
    },

    /// Enrich a checklist with coordinates keyed by pincode.
    Enrich {
        /// Path to the checklist JSON file.
        #[arg(default_value = "checklist-data.json")]
        checklist: PathBuf,

        /// Resolver short name; defaults to the configured default.
        #[arg(long)]
        resolver: Option<String>,

        /// CSV table with pincode, latitude and longitude columns
        /// (lookup resolver only).
        #[arg(long)]
        table: Option<PathBuf>,

        /// Directory where coordsMap.js and not_found.json are written.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { resolver } => configure(&resolver),
            Command::Enrich { checklist, resolver, table, out_dir } => {
                enrich(&checklist, resolver.as_deref(), table.as_deref(), &out_dir).await
            }
        }
    }
}

fn configure(resolver: &str) -> Result<()> {
    let id = ResolverId::try_from(resolver)?;
    let mut config = Config::load()?;

    match id {
        ResolverId::LocalLookup => {
            // The lookup resolver reads its table from `--table`; there are no
            // credentials to store, so configuring it just makes it the default.
            config.set_default_resolver(id);
        }
        ResolverId::RemoteGeocode => {
            if config.is_resolver_configured(id) {
                println!("An API key for '{id}' already exists and will be replaced.");
            }

            let api_key = inquire::Text::new("API key for the remote geocoding service:")
                .prompt()
                .context("Failed to read API key")?;
            let api_key = api_key.trim().to_string();
            if api_key.is_empty() {
                anyhow::bail!("API key must not be empty.");
            }

            config.upsert_resolver_api_key(id, api_key);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn enrich(
    checklist_path: &Path,
    resolver: Option<&str>,
    table: Option<&Path>,
    out_dir: &Path,
) -> Result<()> {
    let config = Config::load()?;

    let id = match resolver {
        Some(name) => ResolverId::try_from(name)?,
        None => config.default_resolver_id()?,
    };

    let checklist = load_checklist(checklist_path)?;

    let table = match table {
        Some(path) => Some(PincodeTable::from_path(path)?),
        None => None,
    };

    let resolver = resolver_from_config(id, &config, table)?;
    let resolution = resolver.resolve(&checklist).await?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let coords_path = out_dir.join("coordsMap.js");
    let js = emit::coords_map_js(&resolution.coords, id == ResolverId::RemoteGeocode)?;
    fs::write(&coords_path, js)
        .with_context(|| format!("Failed to write {}", coords_path.display()))?;

    match id {
        ResolverId::LocalLookup => {
            let report_path = out_dir.join("not_found.json");
            let report = emit::report_json(&resolution.report)?;
            fs::write(&report_path, report)
                .with_context(|| format!("Failed to write {}", report_path.display()))?;

            println!(
                "✅ coordsMap.js created. Default coordinates used for {} missing pincode(s).",
                resolution.report.len()
            );
        }
        ResolverId::RemoteGeocode => {
            println!(
                "✅ coordsMap.js created. Resolved {} of {} pincodes.",
                resolution.coords.len(),
                checklist.len()
            );
        }
    }

    Ok(())
}
