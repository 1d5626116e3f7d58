use axum::{extract::State, routing::get, Json, Router};

use crate::auth::Session;
use crate::db::models::Stats;
use crate::error::AppError;
use crate::AppState;

/// Dashboard counts
async fn stats(State(state): State<AppState>, session: Session) -> Result<Json<Stats>, AppError> {
    if !session.role.is_admin() {
        return Err(AppError::unauthorized());
    }
    Ok(Json(state.store.stats().await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/stats", get(stats))
}
