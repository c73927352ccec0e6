use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::hotels::{HotelOffer, HotelSearchService, LocationQuery, ResolvedOfferSet, SortOrder};
use crate::{TravelBookError, VERSION};

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<HotelSearchService>,
}

#[derive(Debug, Deserialize)]
pub struct HotelSearchParams {
    pub location: Option<String>,
    pub sort: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// JSON error with an HTTP status
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<TravelBookError> for ApiError {
    fn from(err: TravelBookError) -> Self {
        let status = match &err {
            TravelBookError::Validation { .. } => StatusCode::BAD_REQUEST,
            err if err.is_upstream() => StatusCode::BAD_GATEWAY,
            TravelBookError::Config { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hotels", get(search_hotels))
        .route("/offers/{offer_id}", get(get_offer))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

async fn search_hotels(
    State(state): State<AppState>,
    Query(params): Query<HotelSearchParams>,
) -> Result<Json<ResolvedOfferSet>, ApiError> {
    let location = LocationQuery::new(params.location.unwrap_or_default())?;
    let sort = params
        .sort
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()?;

    let mut offers = state.search.search(&location).await;
    if let Some(order) = sort {
        offers.sort_offers(order);
    }
    Ok(Json(offers))
}

async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
) -> Result<Json<HotelOffer>, ApiError> {
    match state.search.offer_details(&offer_id).await? {
        Some(offer) => Ok(Json(offer)),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("Offer {offer_id} not found"),
        }),
    }
}
