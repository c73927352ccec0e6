//! Seams between the hotel pipeline and the services it calls.
//!
//! The pipeline only knows these traits. `crate::amadeus` provides the HTTP
//! implementations; tests substitute in-memory ones.

use std::fmt;

use async_trait::async_trait;

use super::models::{CityCode, HotelId, HotelOffer, HotelOfferBatch, LocationQuery};
use crate::Result;

/// Bearer credential passed explicitly to every collaborator call
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Issues a fresh access token; called once per search
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<AccessToken>;
}

/// Keyword lookup of cities and airports. Only the first match counts.
#[async_trait]
pub trait LocationSearch: Send + Sync {
    async fn search(&self, query: &LocationQuery, token: &AccessToken)
    -> Result<Option<CityCode>>;
}

/// Lists the hotels registered for a city
#[async_trait]
pub trait HotelsByCity: Send + Sync {
    async fn lookup(&self, city: &CityCode, token: &AccessToken) -> Result<Vec<HotelId>>;
}

/// Fetches offers for one batch of at most five hotels
#[async_trait]
pub trait HotelOffers: Send + Sync {
    async fn lookup(&self, batch: &HotelOfferBatch, token: &AccessToken)
    -> Result<Vec<HotelOffer>>;
}

/// Re-fetches a single offer by id, `None` when the provider no longer knows it
#[async_trait]
pub trait OfferDetails: Send + Sync {
    async fn details(&self, offer_id: &str, token: &AccessToken) -> Result<Option<HotelOffer>>;
}
