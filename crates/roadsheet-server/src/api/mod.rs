mod account;
mod admin;
mod health;
mod messages;
mod sheets;


use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    Router,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Id path segment; one that is not a UUID names no resource
pub struct ResourceId(pub Uuid);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let not_found = || AppError::NotFound("Not found".to_string());
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;
        raw.parse().map(ResourceId).map_err(|_| not_found())
    }
}

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(account::router())
        .merge(sheets::router())
        .merge(messages::router())
        .merge(admin::router())
}
