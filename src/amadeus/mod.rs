//! Amadeus self-service API client
//!
//! Implements the hotel pipeline collaborators over HTTP:
//! - OAuth2 client-credentials tokens (`auth`)
//! - Location search, hotels by city, batched hotel offers, offer details
//!
//! Every request carries the caller's bearer token; the client itself holds
//! no credentials.

pub mod auth;
pub mod wire;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::config::AmadeusConfig;
use crate::hotels::{
    AccessToken, CityCode, HotelId, HotelOffer, HotelOfferBatch, HotelOffers, HotelsByCity,
    LocationQuery, LocationSearch, OfferDetails,
};
use crate::{Result, TravelBookError};
use wire::{HotelListing, HotelOffersRecord, ItemEnvelope, ListEnvelope, LocationRecord};

pub use auth::AmadeusTokenProvider;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";
const HOTELS_BY_CITY_PATH: &str = "/v1/reference-data/locations/hotels/by-city";
const HOTEL_OFFERS_PATH: &str = "/v3/shopping/hotel-offers";

/// Location subtypes accepted as a city code source
const LOCATION_SUBTYPES: &str = "CITY,AIRPORT";
const LOCATION_PAGE_LIMIT: u32 = 5;

fn build_http_client(config: &AmadeusConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!("TravelBook/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TravelBookError::config(format!("Failed to create HTTP client: {e}")))
}

/// Amadeus API client for the hotel lookups
pub struct AmadeusClient {
    http: ClientWithMiddleware,
    base_url: String,
}

impl AmadeusClient {
    /// Create a new client
    pub fn new(config: &AmadeusConfig) -> Result<Self> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(build_http_client(config)?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn locations_url(&self, query: &LocationQuery) -> String {
        format!(
            "{}{}?subType={}&keyword={}&page[limit]={}",
            self.base_url,
            LOCATIONS_PATH,
            LOCATION_SUBTYPES,
            urlencoding::encode(query.as_str()),
            LOCATION_PAGE_LIMIT
        )
    }

    fn hotels_by_city_url(&self, city: &CityCode) -> String {
        format!(
            "{}{}?cityCode={}",
            self.base_url,
            HOTELS_BY_CITY_PATH,
            urlencoding::encode(city.as_str())
        )
    }

    fn hotel_offers_url(&self, batch: &HotelOfferBatch) -> String {
        format!(
            "{}{}?hotelIds={}",
            self.base_url,
            HOTEL_OFFERS_PATH,
            urlencoding::encode(&batch.joined_ids())
        )
    }

    fn offer_details_url(&self, offer_id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            HOTEL_OFFERS_PATH,
            urlencoding::encode(offer_id)
        )
    }

    /// Authorized GET, returning the raw response whatever its status
    async fn send(&self, url: &str, token: &AccessToken) -> Result<reqwest::Response> {
        debug!("Amadeus request: GET {}", url);
        self.http
            .get(url)
            .header(AUTHORIZATION, token.bearer_header())
            .send()
            .await
            .map_err(TravelBookError::from)
    }

    /// Authorized GET decoding a successful JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &AccessToken,
        service: &str,
    ) -> Result<T> {
        let response = self.send(url, token).await?;
        Self::decode(response, service).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, service: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TravelBookError::from_status(
                status.as_u16(),
                service,
                error_text,
            ));
        }

        response
            .json()
            .await
            .map_err(|e| TravelBookError::parse(format!("Failed to parse {service} response: {e}")))
    }
}

#[async_trait]
impl LocationSearch for AmadeusClient {
    #[instrument(name = "amadeus_location_search", skip(self, token), fields(keyword = %query))]
    async fn search(
        &self,
        query: &LocationQuery,
        token: &AccessToken,
    ) -> Result<Option<CityCode>> {
        let envelope: ListEnvelope<LocationRecord> = self
            .get_json(&self.locations_url(query), token, "Location search")
            .await?;

        // First match wins; no ranking or disambiguation
        let Some(first) = envelope.data.into_iter().next() else {
            return Ok(None);
        };

        match first.iata_code.as_deref().map(CityCode::new) {
            Some(Ok(code)) => {
                debug!(
                    "'{}' matched {} ({})",
                    query,
                    first.name.as_deref().unwrap_or("unnamed"),
                    code
                );
                Ok(Some(code))
            }
            Some(Err(e)) => {
                debug!("Ignoring first location match for '{}': {}", query, e);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl HotelsByCity for AmadeusClient {
    #[instrument(name = "amadeus_hotels_by_city", skip(self, token), fields(city = %city))]
    async fn lookup(&self, city: &CityCode, token: &AccessToken) -> Result<Vec<HotelId>> {
        let envelope: ListEnvelope<HotelListing> = self
            .get_json(&self.hotels_by_city_url(city), token, "Hotel list")
            .await?;

        let ids: Vec<HotelId> = envelope
            .data
            .into_iter()
            .map(|listing| HotelId::new(listing.hotel_id))
            .collect();

        info!("Found {} hotels listed for {}", ids.len(), city);
        Ok(ids)
    }
}

#[async_trait]
impl HotelOffers for AmadeusClient {
    #[instrument(name = "amadeus_hotel_offers", skip(self, token), fields(batch = batch.index()))]
    async fn lookup(&self, batch: &HotelOfferBatch, token: &AccessToken) -> Result<Vec<HotelOffer>> {
        let envelope: ListEnvelope<serde_json::Value> = self
            .get_json(&self.hotel_offers_url(batch), token, "Hotel offers")
            .await?;

        Ok(wire::decode_hotel_offers(envelope.data))
    }
}

#[async_trait]
impl OfferDetails for AmadeusClient {
    #[instrument(name = "amadeus_offer_details", skip(self, token))]
    async fn details(&self, offer_id: &str, token: &AccessToken) -> Result<Option<HotelOffer>> {
        let response = self.send(&self.offer_details_url(offer_id), token).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: ItemEnvelope<HotelOffersRecord> =
            Self::decode(response, "Hotel offer details").await?;
        Ok(Some(HotelOffer::from(envelope.data)))
    }
}
