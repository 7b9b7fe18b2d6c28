//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - Tolerant decoding of the meteoromania.ro "today" (JSON) and forecast (XML) feeds
//! - Forecast statistics: averages, extremes, trend, top-N and range selection
//! - Feed access (HTTP or local files) and configuration handling
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod service;
pub mod source;

pub use analysis::{AnalysisSummary, NO_DATA, Trend, WeatherAnalysis};
pub use config::{Config, FeedConfig};
pub use error::{ErrorKind, Feed, WeatherError};
pub use model::{CityKey, ForecastDay, WeatherSnapshot};
pub use service::{ForecastProvider, SnapshotIndex, WeatherService};
pub use source::{FeedSource, FileFeed, MeteoRomaniaClient};
