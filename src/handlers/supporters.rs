use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::{
    self,
    models::{petition, support_tier, supporter},
};
use crate::error::ApiError;
use crate::middleware::MaybeUser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupporterResponse {
    pub support_id: i64,
    pub support_tier_id: i64,
    pub message: Option<String>,
    pub supporter_id: i64,
    pub supporter_first_name: String,
    pub supporter_last_name: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /petitions/:id/supporters - newest pledge first
pub async fn list(Path(petition_id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let pool = database::pool()?;
    petition::by_id(pool, petition_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    let rows = supporter::for_petition(pool, petition_id).await?;
    let body: Vec<SupporterResponse> = rows
        .into_iter()
        .map(|row| SupporterResponse {
            support_id: row.id,
            support_tier_id: row.support_tier_id,
            message: row.message,
            supporter_id: row.user_id,
            supporter_first_name: row.first_name,
            supporter_last_name: row.last_name,
            timestamp: row.timestamp,
        })
        .collect();

    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSupportRequest {
    pub support_tier_id: i64,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSupportResponse {
    pub support_id: i64,
}

/// POST /petitions/:id/supporters - no self-support, one pledge per tier
pub async fn add(
    Path(petition_id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
    Json(req): Json<AddSupportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, petition_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id == auth.id {
        return Err(ApiError::forbidden("Cannot support your own petition"));
    }

    // The tier must belong to the petition being pledged to
    support_tier::by_id(pool, petition_id, req.support_tier_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No such support tier for this petition"))?;

    let mut tx = pool.begin().await?;
    if supporter::exists_for_tier_and_user(&mut *tx, req.support_tier_id, auth.id).await? {
        return Err(ApiError::forbidden(
            "Already supporting this petition at this tier",
        ));
    }
    let support_id = supporter::insert(
        &mut *tx,
        petition_id,
        req.support_tier_id,
        auth.id,
        req.message.as_deref(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "User {} pledged to petition {} at tier {}",
        auth.id,
        petition_id,
        req.support_tier_id
    );
    Ok((StatusCode::CREATED, Json(AddSupportResponse { support_id })))
}
