//! Result of one hotel search run
//!
//! The offers are the payload. The remaining fields explain how far the run
//! got, so "resolved, but nothing on offer" is distinguishable from "stopped
//! early because a lookup came back empty or failed".

use serde::Serialize;
use thiserror::Error;

use super::models::{CityCode, HotelOffer};
use super::sorting::{self, SortOrder};

/// Pipeline states that can end a run early.
///
/// Offer batches never end a run: a failed batch is skipped and the rest still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    AcquiringToken,
    ResolvingCity,
    ResolvingHotelIds,
}

/// Why part of a search contributed nothing. None of these abort the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionIssue {
    #[error("no access token available: {reason}")]
    TokenUnavailable { reason: String },

    #[error("no city or airport matches '{location}'")]
    NoLocationMatch {
        location: String,
        reason: Option<String>,
    },

    #[error("no hotels listed for city {city_code}")]
    NoHotelsInCity {
        city_code: String,
        reason: Option<String>,
    },

    #[error("offer batch {batch_index} skipped: {reason}")]
    BatchLookupFailed { batch_index: usize, reason: String },
}

/// Offers in discovery order plus run diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOfferSet {
    offers: Vec<HotelOffer>,
    city_code: Option<CityCode>,
    hotel_count: usize,
    batch_count: usize,
    stopped_at: Option<PipelineStage>,
    issues: Vec<ResolutionIssue>,
}

impl ResolvedOfferSet {
    /// A run that ended before the offer batches, with no offers
    pub(crate) fn stopped(stage: PipelineStage, issue: ResolutionIssue) -> Self {
        Self {
            offers: Vec::new(),
            city_code: None,
            hotel_count: 0,
            batch_count: 0,
            stopped_at: Some(stage),
            issues: vec![issue],
        }
    }

    pub(crate) fn with_city(mut self, city_code: CityCode) -> Self {
        self.city_code = Some(city_code);
        self
    }

    /// A run that attempted every batch
    pub(crate) fn completed(
        city_code: CityCode,
        hotel_count: usize,
        batch_count: usize,
        offers: Vec<HotelOffer>,
        issues: Vec<ResolutionIssue>,
    ) -> Self {
        Self {
            offers,
            city_code: Some(city_code),
            hotel_count,
            batch_count,
            stopped_at: None,
            issues,
        }
    }

    #[must_use]
    pub fn offers(&self) -> &[HotelOffer] {
        &self.offers
    }

    #[must_use]
    pub fn into_offers(self) -> Vec<HotelOffer> {
        self.offers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    #[must_use]
    pub fn city_code(&self) -> Option<&CityCode> {
        self.city_code.as_ref()
    }

    /// Hotel ids discovered for the city
    #[must_use]
    pub fn hotel_count(&self) -> usize {
        self.hotel_count
    }

    /// Offer lookups attempted
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Stage that ended the run early, `None` when every batch was attempted
    #[must_use]
    pub fn stopped_at(&self) -> Option<PipelineStage> {
        self.stopped_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stopped_at.is_none()
    }

    #[must_use]
    pub fn issues(&self) -> &[ResolutionIssue] {
        &self.issues
    }

    /// Indexes of the batches whose lookup failed
    #[must_use]
    pub fn failed_batches(&self) -> Vec<usize> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                ResolutionIssue::BatchLookupFailed { batch_index, .. } => Some(*batch_index),
                _ => None,
            })
            .collect()
    }

    /// Reorder offers for display. Discovery order is lost.
    pub fn sort_offers(&mut self, order: SortOrder) {
        sorting::sort_offers(&mut self.offers, order);
    }
}
