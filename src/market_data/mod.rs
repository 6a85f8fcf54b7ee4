pub mod provider;
pub mod series;
pub mod yahoo;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Bar`).
pub use provider::SeriesProvider;
pub use series::{Bar, Series, SeriesKey};
pub use yahoo::YahooChartClient;
