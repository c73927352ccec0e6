//! Hotel search domain model
//!
//! Everything here lives for a single search: nothing is cached or shared
//! between pipeline runs.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Result, TravelBookError};

/// Upper bound on hotel ids per offer lookup, imposed by the offers endpoint
pub const HOTEL_OFFER_BATCH_SIZE: usize = 5;

/// Free-text city or locality name as typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery(String);

impl LocationQuery {
    /// Accepts any text with at least one non-whitespace character.
    /// The text is forwarded exactly as given.
    pub fn new<S: Into<String>>(text: S) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TravelBookError::validation("Location cannot be empty"));
        }
        Ok(Self(text))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-letter IATA city or airport code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CityCode(String);

impl CityCode {
    pub fn new<S: AsRef<str>>(code: S) -> Result<Self> {
        let code = code.as_ref().trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TravelBookError::validation(format!(
                "'{code}' is not a three-letter IATA code"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CityCode {
    type Error = TravelBookError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CityCode> for String {
    fn from(code: CityCode) -> Self {
        code.0
    }
}

impl fmt::Display for CityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque provider identifier of a hotel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotelId(String);

impl HotelId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HotelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One offer lookup worth of hotel ids.
///
/// Only [`HotelOfferBatch::partition`] creates batches, so a batch never
/// holds more than [`HOTEL_OFFER_BATCH_SIZE`] ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelOfferBatch {
    index: usize,
    hotel_ids: Vec<HotelId>,
}

impl HotelOfferBatch {
    /// Split ids into consecutive batches, keeping discovery order.
    #[must_use]
    pub fn partition(hotel_ids: &[HotelId]) -> Vec<Self> {
        hotel_ids
            .chunks(HOTEL_OFFER_BATCH_SIZE)
            .enumerate()
            .map(|(index, chunk)| Self {
                index,
                hotel_ids: chunk.to_vec(),
            })
            .collect()
    }

    /// Position of this batch in the partition, starting at 0
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn hotel_ids(&self) -> &[HotelId] {
        &self.hotel_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hotel_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotel_ids.is_empty()
    }

    /// Comma separated ids, as the offers endpoint expects them
    #[must_use]
    pub fn joined_ids(&self) -> String {
        self.hotel_ids
            .iter()
            .map(HotelId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Postal address of a hotel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub lines: Vec<String>,
    pub postal_code: Option<String>,
    pub city_name: Option<String>,
    pub country_code: Option<String>,
}

impl Address {
    /// Single line rendering, "N/A" when there is nothing to show
    #[must_use]
    pub fn format_lines(&self) -> String {
        if self.lines.is_empty() {
            "N/A".to_string()
        } else {
            self.lines.join(", ")
        }
    }
}

/// Hotel metadata attached to an offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub hotel_id: HotelId,
    pub name: String,
    pub city_code: Option<String>,
    pub address: Option<Address>,
    /// Star rating, 1-5
    pub rating: Option<u8>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Price of a room offer as quoted by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub base: Option<String>,
    /// Decimal string, kept verbatim
    pub total: String,
}

impl Price {
    /// Total as a number, `None` when the provider sent something unparsable
    #[must_use]
    pub fn total_amount(&self) -> Option<f64> {
        self.total.trim().parse().ok()
    }
}

/// A priced, dated room proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOffer {
    pub id: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub room_category: Option<String>,
    pub room_description: Option<String>,
    pub adults: Option<u32>,
    pub price: Price,
}

impl RoomOffer {
    /// Nights between check-in and check-out
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days()
    }
}

/// A hotel together with its available room offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOffer {
    pub hotel: Hotel,
    pub available: bool,
    pub offers: Vec<RoomOffer>,
}

impl HotelOffer {
    /// Total of the first room offer; the figure list views sort and display by
    #[must_use]
    pub fn lead_price(&self) -> Option<f64> {
        self.offers.first().and_then(|offer| offer.price.total_amount())
    }
}
