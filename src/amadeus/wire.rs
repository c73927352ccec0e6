//! Amadeus response structures and conversion into the hotel domain model

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::hotels::{Address, Hotel, HotelId, HotelOffer, Price, RoomOffer};

/// `{"data": [...]}` wrapper shared by the list endpoints
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `{"data": {...}}` wrapper of single-resource endpoints
#[derive(Debug, Deserialize)]
pub struct ItemEnvelope<T> {
    pub data: T,
}

/// Entry of `/v1/reference-data/locations`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub iata_code: Option<String>,
    pub name: Option<String>,
    pub sub_type: Option<String>,
}

/// Entry of `/v1/reference-data/locations/hotels/by-city`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelListing {
    pub hotel_id: String,
    pub name: Option<String>,
}

/// Entry of `/v3/shopping/hotel-offers`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffersRecord {
    pub hotel: HotelRecord,
    pub available: Option<bool>,
    #[serde(default)]
    pub offers: Vec<OfferRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelRecord {
    pub hotel_id: String,
    pub name: Option<String>,
    pub city_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<RatingValue>,
    pub address: Option<AddressRecord>,
}

/// Ratings arrive as `"4"` from the offers API and as `4` elsewhere
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    Number(u8),
    Text(String),
}

impl RatingValue {
    fn stars(&self) -> Option<u8> {
        let stars = match self {
            RatingValue::Number(n) => Some(*n),
            RatingValue::Text(s) => s.trim().parse().ok(),
        };
        stars.filter(|s| (1..=5).contains(s))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    #[serde(default)]
    pub lines: Vec<String>,
    pub postal_code: Option<String>,
    pub city_name: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    pub id: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub room: Option<RoomRecord>,
    pub guests: Option<GuestsRecord>,
    pub price: PriceRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub type_estimated: Option<TypeEstimatedRecord>,
    pub description: Option<DescriptionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct TypeEstimatedRecord {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionRecord {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuestsRecord {
    pub adults: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PriceRecord {
    pub currency: String,
    pub base: Option<String>,
    pub total: String,
}

impl From<AddressRecord> for Address {
    fn from(record: AddressRecord) -> Self {
        Self {
            lines: record.lines,
            postal_code: record.postal_code,
            city_name: record.city_name,
            country_code: record.country_code,
        }
    }
}

impl From<HotelRecord> for Hotel {
    fn from(record: HotelRecord) -> Self {
        let rating = record.rating.as_ref().and_then(RatingValue::stars);
        Self {
            name: record.name.unwrap_or_else(|| record.hotel_id.clone()),
            hotel_id: HotelId::new(record.hotel_id),
            city_code: record.city_code,
            address: record.address.map(Address::from),
            rating,
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

impl From<OfferRecord> for RoomOffer {
    fn from(record: OfferRecord) -> Self {
        let (room_category, room_description) = match record.room {
            Some(room) => (
                room.type_estimated.and_then(|t| t.category),
                room.description.and_then(|d| d.text),
            ),
            None => (None, None),
        };

        Self {
            id: record.id,
            check_in_date: record.check_in_date,
            check_out_date: record.check_out_date,
            room_category,
            room_description,
            adults: record.guests.and_then(|g| g.adults),
            price: Price {
                currency: record.price.currency,
                base: record.price.base,
                total: record.price.total,
            },
        }
    }
}

impl From<HotelOffersRecord> for HotelOffer {
    fn from(record: HotelOffersRecord) -> Self {
        Self {
            hotel: Hotel::from(record.hotel),
            available: record.available.unwrap_or(true),
            offers: record.offers.into_iter().map(RoomOffer::from).collect(),
        }
    }
}

/// Convert the `data` entries of an offers response one by one.
///
/// A malformed hotel record is logged and left out; the others are kept.
pub fn decode_hotel_offers(records: Vec<Value>) -> Vec<HotelOffer> {
    records
        .into_iter()
        .filter_map(|record| {
            let hotel_id = record
                .pointer("/hotel/hotelId")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            match serde_json::from_value::<HotelOffersRecord>(record) {
                Ok(parsed) => Some(HotelOffer::from(parsed)),
                Err(e) => {
                    warn!("Skipping malformed offer record for hotel {}: {}", hotel_id, e);
                    None
                }
            }
        })
        .collect()
}
