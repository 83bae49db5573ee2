//! HTTP surface of the gateway: thin handlers over the workflows.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use librarium_core::{BookInfo, Library, LibraryUid, Rating, ReservationUid, Username};
use validator::Validate;

use crate::clients::X_USER_NAME;
use crate::dto::{
    BooksQuery, CreateReservationRequest, CreateReservationResponse, LibrariesQuery,
    ReservationView, ReturnRequest, StatsInfo,
};
use crate::error::{GatewayError, GatewayResult};
use crate::workflows::ReservationWorkflows;

#[derive(Clone)]
pub struct AppState {
    pub workflows: Arc<ReservationWorkflows>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/libraries", get(list_libraries))
        .route("/libraries/:uid/books", get(list_books))
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route("/reservations/:uid/return", axum::routing::post(return_reservation))
        .route("/rating", get(get_rating))
        .route("/stats", get(get_stats))
        .with_state(state)
}

/// Caller identity carried in the `X-User-Name` header; the identity
/// provider in front of the gateway is trusted to have set it.
pub struct CallerIdentity(pub Username);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(X_USER_NAME)
            .and_then(|value| value.to_str().ok())
            .ok_or(GatewayError::Unauthorized)?;
        let username = Username::parse(value).map_err(|_| GatewayError::Unauthorized)?;
        Ok(Self(username))
    }
}

async fn list_libraries(
    State(state): State<AppState>,
    CallerIdentity(_user): CallerIdentity,
    Query(query): Query<LibrariesQuery>,
) -> GatewayResult<Json<Vec<Library>>> {
    let libraries = state.workflows.get_libraries(&query.city).await?;
    Ok(Json(libraries))
}

async fn list_books(
    State(state): State<AppState>,
    CallerIdentity(_user): CallerIdentity,
    Path(library_uid): Path<LibraryUid>,
    Query(query): Query<BooksQuery>,
) -> GatewayResult<Json<Vec<BookInfo>>> {
    let books = state.workflows.get_books(library_uid, query.show_all).await?;
    Ok(Json(books))
}

async fn list_reservations(
    State(state): State<AppState>,
    CallerIdentity(user): CallerIdentity,
) -> GatewayResult<Json<Vec<ReservationView>>> {
    let views = state.workflows.get_reservations(&user).await?;
    Ok(Json(views))
}

async fn create_reservation(
    State(state): State<AppState>,
    CallerIdentity(user): CallerIdentity,
    Json(payload): Json<CreateReservationRequest>,
) -> GatewayResult<Json<CreateReservationResponse>> {
    payload.validate()?;
    let response = state.workflows.create_reservation(&user, payload).await?;
    Ok(Json(response))
}

async fn return_reservation(
    State(state): State<AppState>,
    CallerIdentity(user): CallerIdentity,
    Path(reservation_uid): Path<ReservationUid>,
    Json(payload): Json<ReturnRequest>,
) -> GatewayResult<StatusCode> {
    state
        .workflows
        .return_reservation(&user, reservation_uid, payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_rating(
    State(state): State<AppState>,
    CallerIdentity(user): CallerIdentity,
) -> GatewayResult<Json<Rating>> {
    let rating = state.workflows.get_rating(&user).await?;
    Ok(Json(rating))
}

async fn get_stats(
    State(state): State<AppState>,
    CallerIdentity(user): CallerIdentity,
) -> GatewayResult<Json<StatsInfo>> {
    let stats = state.workflows.get_stats(&user).await?;
    Ok(Json(stats))
}
