//! Hotel search module
//!
//! - Domain model shared by every stage (`models`)
//! - Collaborator traits the pipeline calls through (`collaborators`)
//! - The resolution pipeline itself (`pipeline`) and its result (`outcome`)
//! - Token-acquiring entry point (`service`)
//! - Consumer-side ordering and hourly pricing (`sorting`)

pub mod collaborators;
pub mod models;
pub mod outcome;
pub mod pipeline;
pub mod service;
pub mod sorting;

pub use collaborators::{
    AccessToken, HotelOffers, HotelsByCity, LocationSearch, OfferDetails, TokenProvider,
};
pub use models::{
    Address, CityCode, HOTEL_OFFER_BATCH_SIZE, Hotel, HotelId, HotelOffer, HotelOfferBatch,
    LocationQuery, Price, RoomOffer,
};
pub use outcome::{PipelineStage, ResolutionIssue, ResolvedOfferSet};
pub use pipeline::{HotelResolver, PipelineSettings};
pub use service::HotelSearchService;
pub use sorting::{SortOrder, StayHours, sort_offers};
