//! Core library for the `pincoords` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over coordinate resolution strategies
//! - Shared domain models (checklist items, coordinate map, fallback report)
//! - Serialization of the enrichment artifacts
//!
//! It is used by `pincoords-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod emit;
pub mod model;
pub mod resolver;

pub use config::{Config, FallbackConfig, GeocodingConfig, ResolverConfig};
pub use model::{ChecklistItem, CoordinateEntry, CoordsMap, ReportEntry, load_checklist};
pub use resolver::lookup::{LocalLookupResolver, PincodeTable};
pub use resolver::remote::{GeocodeError, RemoteGeocodeResolver};
pub use resolver::{CoordinateResolver, Resolution, ResolverId, resolver_from_config};
