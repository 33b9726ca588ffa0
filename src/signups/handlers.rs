use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{CreateSignupRequest, ExistsQuery, ExistsResponse};
use super::repo_types::EmailSignup;
use super::services::{normalize_email, NewSignup};
use super::SignupError;
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signups", post(create_signup).get(list_signups))
        .route("/signups/exists", get(signup_exists))
}

#[instrument(skip(state, payload))]
pub async fn create_signup(
    State(state): State<AppState>,
    Json(payload): Json<CreateSignupRequest>,
) -> Result<(StatusCode, Json<EmailSignup>), ApiError> {
    let signup = NewSignup::new(&payload.email, payload.source.as_deref()).map_err(|e| {
        warn!(email = %payload.email, "invalid email");
        e
    })?;
    match state.signups.create(signup).await {
        Ok(row) => {
            info!(id = row.id, source = %row.source, "email signed up");
            Ok((StatusCode::CREATED, Json(row)))
        }
        Err(SignupError::AlreadyRegistered) => {
            warn!("email already registered");
            Err(SignupError::AlreadyRegistered.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, q))]
pub async fn signup_exists(
    State(state): State<AppState>,
    Query(q): Query<ExistsQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state.signups.exists(&normalize_email(&q.email)).await?;
    Ok(Json(ExistsResponse { exists }))
}

#[instrument(skip(state))]
pub async fn list_signups(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmailSignup>>, ApiError> {
    Ok(Json(state.signups.list().await?))
}
