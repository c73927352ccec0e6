//! Entry point used by the CLI and the HTTP API.
//!
//! Acquires one access token per search and threads it explicitly through
//! the pipeline. Nothing is kept between searches.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, instrument, warn};

use super::collaborators::{AccessToken, OfferDetails, TokenProvider};
use super::models::{HotelOffer, LocationQuery};
use super::outcome::{PipelineStage, ResolutionIssue, ResolvedOfferSet};
use super::pipeline::{HotelResolver, PipelineSettings, with_deadline};
use crate::amadeus::{AmadeusClient, AmadeusTokenProvider};
use crate::config::TravelBookConfig;
use crate::{Result, TravelBookError};

pub struct HotelSearchService {
    tokens: Arc<dyn TokenProvider>,
    resolver: HotelResolver,
    details: Arc<dyn OfferDetails>,
}

impl HotelSearchService {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        resolver: HotelResolver,
        details: Arc<dyn OfferDetails>,
    ) -> Self {
        Self {
            tokens,
            resolver,
            details,
        }
    }

    /// Wire the service to the Amadeus APIs described by `config`
    pub fn from_config(config: &TravelBookConfig) -> anyhow::Result<Self> {
        let client = Arc::new(
            AmadeusClient::new(&config.amadeus).context("Failed to create Amadeus client")?,
        );
        let tokens = Arc::new(
            AmadeusTokenProvider::new(&config.amadeus)
                .context("Failed to create Amadeus token provider")?,
        );
        let resolver = HotelResolver::new(
            client.clone(),
            client.clone(),
            client.clone(),
            PipelineSettings::from(&config.pipeline),
        );

        Ok(Self::new(tokens, resolver, client))
    }

    #[must_use]
    pub fn resolver(&self) -> &HotelResolver {
        &self.resolver
    }

    /// Search hotel offers for a free-text location.
    ///
    /// A missing token ends the search immediately with an empty result.
    #[instrument(skip_all, fields(location = %location))]
    pub async fn search(&self, location: &LocationQuery) -> ResolvedOfferSet {
        let token = match self.acquire_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("No access token, skipping hotel search: {}", e);
                return ResolvedOfferSet::stopped(
                    PipelineStage::AcquiringToken,
                    ResolutionIssue::TokenUnavailable {
                        reason: e.to_string(),
                    },
                );
            }
        };

        self.resolver.resolve_offers(location, &token).await
    }

    /// Fetch the current state of a single offer, `None` when it is gone
    #[instrument(skip(self))]
    pub async fn offer_details(&self, offer_id: &str) -> Result<Option<HotelOffer>> {
        let offer_id = offer_id.trim();
        if offer_id.is_empty() {
            return Err(TravelBookError::validation("Offer id cannot be empty"));
        }

        let token = self.acquire_token().await?;
        let lookup = self.details.details(offer_id, &token);
        let offer = with_deadline("offer details", self.resolver.settings().call_timeout, lookup)
            .await?;

        if offer.is_none() {
            info!("Offer {} is no longer available", offer_id);
        }
        Ok(offer)
    }

    async fn acquire_token(&self) -> Result<AccessToken> {
        let call_timeout = self.resolver.settings().call_timeout;
        with_deadline("access token", call_timeout, self.tokens.get_token()).await
    }
}
