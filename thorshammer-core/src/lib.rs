//! Core library for the `thorshammer` weather poller.
//!
//! This crate defines:
//! - Report normalization and condition derivation
//! - Geocoding and weather provider clients
//! - The collection loop with its daily JSON backup
//! - Configuration & credentials handling
//!
//! It is used by `thorshammer-cli`, but the loop is independent of any
//! particular front end.

pub mod backup;
pub mod collection;
pub mod collector;
pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod schedule;

pub use backup::BackupWriter;
pub use collection::{FlushPolicy, ReportCollection};
pub use collector::{CollectionLoop, CycleStage, CycleState};
pub use config::Config;
pub use error::{FetchError, GeocodeError, NormalizationError, PersistenceError, ProviderError};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use model::{Condition, Coordinates, Measurement, Units, WeatherReport};
pub use normalize::{derive_condition, normalize};
pub use provider::{ProviderId, RawPayload, WeatherProvider};
