//! Phone link lookup

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CheckPhoneRequest {
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckPhoneResponse {
    pub linked: bool,
}

/// `linked` is true iff a contact share stored this (normalized) phone
pub async fn check_phone(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckPhoneRequest>,
) -> Result<Json<CheckPhoneResponse>, ApiError> {
    let linked = state.directory.is_linked(&request.phone).await?;
    debug!("check-phone {} -> linked={}", request.phone, linked);
    Ok(Json(CheckPhoneResponse { linked }))
}
