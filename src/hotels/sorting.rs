//! Ordering and hourly pricing used by the result consumers.
//!
//! The pipeline itself never reorders offers; these helpers are applied by
//! the CLI and the HTTP API after a search returns.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::models::HotelOffer;
use crate::TravelBookError;

/// Display order for a list of hotel offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "price-asc")]
    PriceLowToHigh,
    #[serde(rename = "price-desc")]
    PriceHighToLow,
    /// Highest star rating first
    #[serde(rename = "popular")]
    Popular,
}

impl FromStr for SortOrder {
    type Err = TravelBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price-asc" | "low-to-high" => Ok(Self::PriceLowToHigh),
            "price-desc" | "high-to-low" => Ok(Self::PriceHighToLow),
            "popular" | "rating" => Ok(Self::Popular),
            other => Err(TravelBookError::validation(format!(
                "Unknown sort order '{other}'. Must be one of: price-asc, price-desc, popular"
            ))),
        }
    }
}

/// Stable in-place sort. Unpriced offers count as 0, unrated hotels as 0 stars.
pub fn sort_offers(offers: &mut [HotelOffer], order: SortOrder) {
    let price = |offer: &HotelOffer| offer.lead_price().unwrap_or(0.0);
    let rating = |offer: &HotelOffer| offer.hotel.rating.unwrap_or(0);

    match order {
        SortOrder::PriceLowToHigh => offers.sort_by(|a, b| compare_prices(price(a), price(b))),
        SortOrder::PriceHighToLow => offers.sort_by(|a, b| compare_prices(price(b), price(a))),
        SortOrder::Popular => offers.sort_by_key(|offer| std::cmp::Reverse(rating(offer))),
    }
}

fn compare_prices(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Short-stay durations offered on the booking form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StayHours {
    Three,
    Six,
    Twelve,
    TwentyFour,
}

impl StayHours {
    #[must_use]
    pub fn hours(self) -> u32 {
        match self {
            StayHours::Three => 3,
            StayHours::Six => 6,
            StayHours::Twelve => 12,
            StayHours::TwentyFour => 24,
        }
    }

    /// Share of the full-day price charged for this duration
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            StayHours::Three => 0.25,
            StayHours::Six => 0.5,
            StayHours::Twelve => 0.75,
            StayHours::TwentyFour => 1.0,
        }
    }

    /// Price for this many hours, rounded to cents
    #[must_use]
    pub fn price(self, full_day_total: f64) -> f64 {
        (full_day_total * self.multiplier() * 100.0).round() / 100.0
    }
}

impl TryFrom<u32> for StayHours {
    type Error = TravelBookError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        match hours {
            3 => Ok(Self::Three),
            6 => Ok(Self::Six),
            12 => Ok(Self::Twelve),
            24 => Ok(Self::TwentyFour),
            other => Err(TravelBookError::validation(format!(
                "Unsupported stay of {other} hours. Must be 3, 6, 12 or 24"
            ))),
        }
    }
}
