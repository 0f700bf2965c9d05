use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::database::{
    self,
    models::{petition, support_tier},
};
use crate::error::ApiError;
use crate::middleware::MaybeUser;

use super::petitions::{validate_tier_fields, TierRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTierResponse {
    pub support_tier_id: i64,
}

/// POST /petitions/:id/supportTiers - owner only, capped at three tiers
pub async fn add(
    Path(petition_id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
    Json(req): Json<TierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, petition_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden(
            "Only the owner may modify a petition's support tiers",
        ));
    }

    validate_tier_fields(Some(req.title.as_str()), Some(req.cost))?;

    let mut tx = pool.begin().await?;
    if support_tier::count_for_petition(&mut *tx, petition_id).await? >= 3 {
        return Err(ApiError::forbidden(
            "Cannot add a support tier: the petition already has 3",
        ));
    }
    if support_tier::title_in_use(&mut *tx, petition_id, &req.title, None).await? {
        return Err(ApiError::forbidden(
            "Support tier title already in use for this petition",
        ));
    }
    let support_tier_id =
        support_tier::insert(&mut *tx, petition_id, &req.title, &req.description, req.cost)
            .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(AddTierResponse { support_tier_id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTierRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
}

/// PATCH /petitions/:id/supportTiers/:tierId - frozen once anyone pledges
pub async fn edit(
    Path((petition_id, tier_id)): Path<(i64, i64)>,
    Extension(session): Extension<MaybeUser>,
    Json(req): Json<EditTierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, petition_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden(
            "Only the owner may modify a petition's support tiers",
        ));
    }

    support_tier::by_id(pool, petition_id, tier_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No such support tier for this petition"))?;

    let changes = support_tier::SupportTierChanges {
        title: req.title,
        description: req.description,
        cost: req.cost,
    };
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields provided to update"));
    }
    validate_tier_fields(changes.title.as_deref(), changes.cost)?;

    let mut tx = pool.begin().await?;
    if support_tier::has_supporters(&mut *tx, tier_id).await? {
        return Err(ApiError::forbidden(
            "Cannot edit a support tier that already has a supporter",
        ));
    }
    if let Some(ref title) = changes.title {
        if support_tier::title_in_use(&mut *tx, petition_id, title, Some(tier_id)).await? {
            return Err(ApiError::forbidden(
                "Support tier title already in use for this petition",
            ));
        }
    }
    support_tier::update(&mut *tx, tier_id, &changes).await?;
    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// DELETE /petitions/:id/supportTiers/:tierId - never the last tier, never a
/// pledged one
pub async fn remove(
    Path((petition_id, tier_id)): Path<(i64, i64)>,
    Extension(session): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, petition_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden(
            "Only the owner may modify a petition's support tiers",
        ));
    }

    support_tier::by_id(pool, petition_id, tier_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No such support tier for this petition"))?;

    let mut tx = pool.begin().await?;
    if support_tier::has_supporters(&mut *tx, tier_id).await? {
        return Err(ApiError::forbidden(
            "Cannot delete a support tier that already has a supporter",
        ));
    }
    if support_tier::count_for_petition(&mut *tx, petition_id).await? <= 1 {
        return Err(ApiError::forbidden(
            "Cannot delete the only support tier of a petition",
        ));
    }
    support_tier::delete(&mut *tx, tier_id).await?;
    tx.commit().await?;

    Ok(StatusCode::OK)
}
