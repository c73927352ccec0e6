//! Hotel Resolution Pipeline
//!
//! Turns a free-text location into hotel offers through three chained
//! lookups: location search for the IATA city code, the city's hotel ids,
//! then one offer lookup per batch of five ids. Empty or failed lookups end
//! the run early with an empty result; a failed batch is skipped and the
//! remaining batches still run.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use super::collaborators::{AccessToken, HotelOffers, HotelsByCity, LocationSearch};
use super::models::{CityCode, HotelId, HotelOffer, HotelOfferBatch, LocationQuery};
use super::outcome::{PipelineStage, ResolutionIssue, ResolvedOfferSet};
use crate::config::PipelineConfig;
use crate::{Result, TravelBookError};

/// Runtime knobs of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Deadline for every single collaborator call
    pub call_timeout: Duration,
    /// Offer lookups in flight at once. 1 means strictly one after another.
    pub max_concurrent_batches: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            call_timeout: config.call_timeout(),
            max_concurrent_batches: usize::try_from(config.max_concurrent_batches)
                .unwrap_or(1)
                .max(1),
        }
    }
}

/// Run `call`, failing with [`TravelBookError::Timeout`] once `limit` passes
pub(crate) async fn with_deadline<T>(
    operation: &str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TravelBookError::timeout(operation, limit)),
    }
}

/// Resolves a location into bookable hotel offers
pub struct HotelResolver {
    locations: Arc<dyn LocationSearch>,
    hotels: Arc<dyn HotelsByCity>,
    offers: Arc<dyn HotelOffers>,
    settings: PipelineSettings,
}

impl HotelResolver {
    pub fn new(
        locations: Arc<dyn LocationSearch>,
        hotels: Arc<dyn HotelsByCity>,
        offers: Arc<dyn HotelOffers>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            locations,
            hotels,
            offers,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Resolve `location` into offers using an already issued `token`.
    ///
    /// Never fails: every problem is logged, recorded in
    /// [`ResolvedOfferSet::issues`] and contributes no offers.
    #[instrument(name = "resolve_offers", skip_all, fields(location = %location))]
    pub async fn resolve_offers(
        &self,
        location: &LocationQuery,
        token: &AccessToken,
    ) -> ResolvedOfferSet {
        let city_code = match self.resolve_city(location, token).await {
            Ok(city_code) => city_code,
            Err(issue) => return ResolvedOfferSet::stopped(PipelineStage::ResolvingCity, issue),
        };

        let hotel_ids = match self.resolve_hotel_ids(&city_code, token).await {
            Ok(hotel_ids) => hotel_ids,
            Err(issue) => {
                return ResolvedOfferSet::stopped(PipelineStage::ResolvingHotelIds, issue)
                    .with_city(city_code);
            }
        };

        let batches = HotelOfferBatch::partition(&hotel_ids);
        let batch_count = batches.len();
        debug!(
            "Fetching offers for {} hotels in {} batches (concurrency {})",
            hotel_ids.len(),
            batch_count,
            self.settings.max_concurrent_batches
        );

        let (offers, issues) = self.fetch_offer_batches(batches, token).await;

        info!(
            "Resolved {} hotel offers for '{}' ({} of {} batches failed)",
            offers.len(),
            location,
            issues.len(),
            batch_count
        );

        ResolvedOfferSet::completed(city_code, hotel_ids.len(), batch_count, offers, issues)
    }

    async fn resolve_city(
        &self,
        location: &LocationQuery,
        token: &AccessToken,
    ) -> std::result::Result<CityCode, ResolutionIssue> {
        let lookup = self.locations.search(location, token);
        match with_deadline("location search", self.settings.call_timeout, lookup).await {
            Ok(Some(city_code)) => {
                debug!("Resolved '{}' to city code {}", location, city_code);
                Ok(city_code)
            }
            Ok(None) => {
                info!("Could not resolve city code for '{}'", location);
                Err(ResolutionIssue::NoLocationMatch {
                    location: location.to_string(),
                    reason: None,
                })
            }
            Err(e) => {
                warn!("Location search for '{}' failed: {}", location, e);
                Err(ResolutionIssue::NoLocationMatch {
                    location: location.to_string(),
                    reason: Some(e.to_string()),
                })
            }
        }
    }

    async fn resolve_hotel_ids(
        &self,
        city_code: &CityCode,
        token: &AccessToken,
    ) -> std::result::Result<Vec<HotelId>, ResolutionIssue> {
        let lookup = self.hotels.lookup(city_code, token);
        match with_deadline("hotels by city", self.settings.call_timeout, lookup).await {
            Ok(hotel_ids) if !hotel_ids.is_empty() => {
                debug!("Found {} hotels in {}", hotel_ids.len(), city_code);
                Ok(hotel_ids)
            }
            Ok(_) => {
                info!("No hotels listed for city {}", city_code);
                Err(ResolutionIssue::NoHotelsInCity {
                    city_code: city_code.to_string(),
                    reason: None,
                })
            }
            Err(e) => {
                warn!("Hotel list for city {} failed: {}", city_code, e);
                Err(ResolutionIssue::NoHotelsInCity {
                    city_code: city_code.to_string(),
                    reason: Some(e.to_string()),
                })
            }
        }
    }

    /// Look up every batch and fold the outcomes in batch order.
    ///
    /// `buffered` keeps output order equal to input order whatever the
    /// concurrency, so the merge is deterministic.
    async fn fetch_offer_batches(
        &self,
        batches: Vec<HotelOfferBatch>,
        token: &AccessToken,
    ) -> (Vec<HotelOffer>, Vec<ResolutionIssue>) {
        stream::iter(batches)
            .map(|batch| self.fetch_offer_batch(batch, token))
            .buffered(self.settings.max_concurrent_batches.max(1))
            .fold(
                (Vec::new(), Vec::new()),
                |(mut offers, mut issues), outcome| async move {
                    match outcome {
                        Ok(batch_offers) => offers.extend(batch_offers),
                        Err(issue) => issues.push(issue),
                    }
                    (offers, issues)
                },
            )
            .await
    }

    async fn fetch_offer_batch(
        &self,
        batch: HotelOfferBatch,
        token: &AccessToken,
    ) -> std::result::Result<Vec<HotelOffer>, ResolutionIssue> {
        let lookup = self.offers.lookup(&batch, token);
        match with_deadline("hotel offers", self.settings.call_timeout, lookup).await {
            Ok(offers) => {
                debug!(
                    "Batch {} returned {} offers for {} hotels",
                    batch.index(),
                    offers.len(),
                    batch.len()
                );
                Ok(offers)
            }
            Err(e) => {
                warn!(
                    "Skipping offer batch {} ({}): {}",
                    batch.index(),
                    batch.joined_ids(),
                    e
                );
                Err(ResolutionIssue::BatchLookupFailed {
                    batch_index: batch.index(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
