//! `TravelBook` - Hotel offer search over the Amadeus travel APIs
//!
//! This library resolves a free-text location to a city code, discovers the
//! hotels listed in that city and collects their offers in batches, keeping
//! whatever succeeds when individual lookups fail.

pub mod amadeus;
pub mod api;
pub mod config;
pub mod error;
pub mod hotels;
pub mod logging;
pub mod web;

// Re-export core types for public API
pub use amadeus::{AmadeusClient, AmadeusTokenProvider};
pub use config::TravelBookConfig;
pub use error::TravelBookError;
pub use hotels::{
    CityCode, HotelId, HotelOffer, HotelOfferBatch, HotelResolver, HotelSearchService,
    LocationQuery, PipelineSettings, ResolvedOfferSet, SortOrder,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelBookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
