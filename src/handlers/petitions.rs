use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use axum_extra::extract::Query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::{
    self,
    models::{category, petition, support_tier, supporter},
};
use crate::error::ApiError;
use crate::filter::{PetitionFilter, PetitionSort};
use crate::middleware::MaybeUser;
use crate::storage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub start_index: Option<u32>,
    pub count: Option<u32>,
    pub q: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    pub supporting_cost: Option<i64>,
    pub owner_id: Option<i64>,
    pub supporter_id: Option<i64>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionOverview {
    pub petition_id: i64,
    pub title: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: DateTime<Utc>,
    pub supporting_cost: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub petitions: Vec<PetitionOverview>,
    pub count: i64,
}

/// GET /petitions - filtered, sorted, paginated listing
pub async fn list(Query(params): Query<ListParams>) -> Result<impl IntoResponse, ApiError> {
    let filter = PetitionFilter {
        // an empty q matches everything; treat it as absent
        q: params.q.filter(|q| !q.is_empty()),
        category_ids: params.category_ids,
        supporting_cost: params.supporting_cost,
        owner_id: params.owner_id,
        supporter_id: params.supporter_id,
        sort: PetitionSort::parse(params.sort_by.as_deref()),
        start_index: params.start_index.unwrap_or(0),
        count: params.count,
    };

    let pool = database::pool()?;
    let (rows, total) = petition::search(pool, &filter).await?;

    if rows.is_empty() {
        return Err(ApiError::not_found("No petitions found"));
    }

    let petitions = rows
        .into_iter()
        .map(|row| PetitionOverview {
            petition_id: row.id,
            title: row.title,
            category_id: row.category_id,
            owner_id: row.owner_id,
            owner_first_name: row.owner_first_name,
            owner_last_name: row.owner_last_name,
            number_of_supporters: row.number_of_supporters,
            creation_date: row.creation_date,
            supporting_cost: row.supporting_cost,
        })
        .collect();

    Ok(Json(ListResponse {
        petitions,
        count: total,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTierResponse {
    pub support_tier_id: i64,
    pub title: String,
    pub description: String,
    pub cost: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionDetailResponse {
    pub petition_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: DateTime<Utc>,
    pub money_raised: i64,
    pub support_tiers: Vec<SupportTierResponse>,
}

/// GET /petitions/:id
pub async fn detail(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let pool = database::pool()?;
    let found = petition::detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    let tiers = support_tier::for_petition(pool, id).await?;

    Ok(Json(PetitionDetailResponse {
        petition_id: found.id,
        title: found.title,
        description: found.description,
        category_id: found.category_id,
        owner_id: found.owner_id,
        owner_first_name: found.owner_first_name,
        owner_last_name: found.owner_last_name,
        number_of_supporters: found.number_of_supporters,
        creation_date: found.creation_date,
        money_raised: found.money_raised,
        support_tiers: tiers
            .into_iter()
            .map(|t| SupportTierResponse {
                support_tier_id: t.id,
                title: t.title,
                description: t.description,
                cost: t.cost,
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub category_id: i64,
    pub name: String,
}

/// GET /petitions/categories
pub async fn categories() -> Result<impl IntoResponse, ApiError> {
    let pool = database::pool()?;
    let rows = category::all(pool).await?;
    let body: Vec<CategoryResponse> = rows
        .into_iter()
        .map(|c| CategoryResponse {
            category_id: c.id,
            name: c.name,
        })
        .collect();
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRequest {
    pub title: String,
    pub description: String,
    pub cost: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetitionRequest {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub support_tiers: Vec<TierRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetitionResponse {
    pub petition_id: i64,
}

/// POST /petitions - petition and its 1..=3 tiers land atomically
pub async fn create(
    Extension(session): Extension<MaybeUser>,
    Json(req): Json<CreatePetitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    if req.title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    if req.support_tiers.is_empty() || req.support_tiers.len() > 3 {
        return Err(ApiError::bad_request(
            "a petition must have between 1 and 3 support tiers",
        ));
    }
    for tier in &req.support_tiers {
        validate_tier_fields(Some(tier.title.as_str()), Some(tier.cost))?;
    }
    for (i, tier) in req.support_tiers.iter().enumerate() {
        if req.support_tiers[..i].iter().any(|t| t.title == tier.title) {
            return Err(ApiError::bad_request(
                "support tier titles must be unique within the petition",
            ));
        }
    }

    let pool = database::pool()?;
    if !category::exists(pool, req.category_id).await? {
        return Err(ApiError::bad_request(
            "categoryId must reference an existing category",
        ));
    }
    if petition::title_in_use(pool, &req.title, None).await? {
        return Err(ApiError::forbidden("Petition title already in use"));
    }

    let mut tx = pool.begin().await?;
    let petition_id =
        petition::insert(&mut *tx, &req.title, &req.description, req.category_id, auth.id).await?;
    for tier in &req.support_tiers {
        support_tier::insert(&mut *tx, petition_id, &tier.title, &tier.description, tier.cost)
            .await?;
    }
    tx.commit().await?;

    tracing::info!("User {} created petition {}", auth.id, petition_id);
    Ok((
        StatusCode::CREATED,
        Json(CreatePetitionResponse { petition_id }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPetitionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// PATCH /petitions/:id - owner only; title uniqueness is re-validated
pub async fn edit(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
    Json(req): Json<EditPetitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden("Only the owner may edit a petition"));
    }

    let changes = petition::PetitionChanges {
        title: req.title,
        description: req.description,
        category_id: req.category_id,
    };
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields provided to update"));
    }

    if let Some(ref title) = changes.title {
        if title.is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }
    }
    if let Some(category_id) = changes.category_id {
        if !category::exists(pool, category_id).await? {
            return Err(ApiError::bad_request(
                "categoryId must reference an existing category",
            ));
        }
    }
    if let Some(ref title) = changes.title {
        if petition::title_in_use(pool, title, Some(id)).await? {
            return Err(ApiError::forbidden("Petition title already in use"));
        }
    }

    let mut tx = pool.begin().await?;
    petition::update(&mut *tx, id, &changes).await?;
    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// DELETE /petitions/:id - owner only, and only while nobody has pledged
pub async fn remove(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden("Only the owner may delete a petition"));
    }

    let mut tx = pool.begin().await?;
    if supporter::exists_for_petition(&mut *tx, id).await? {
        return Err(ApiError::forbidden(
            "Cannot delete a petition with one or more supporters",
        ));
    }
    petition::delete(&mut *tx, id).await?;
    tx.commit().await?;

    // The row is gone; a leftover file is only worth a warning
    if let Some(filename) = found.image_filename {
        if let Err(e) = storage::remove(&filename).await {
            tracing::warn!("Failed to remove image for deleted petition {}: {}", id, e);
        }
    }

    tracing::info!("User {} deleted petition {}", auth.id, id);
    Ok(StatusCode::OK)
}

pub(crate) fn validate_tier_fields(
    title: Option<&str>,
    cost: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(title) = title {
        if title.is_empty() {
            return Err(ApiError::bad_request("support tier title must not be empty"));
        }
    }
    if let Some(cost) = cost {
        if cost < 0 {
            return Err(ApiError::bad_request("support tier cost must be non-negative"));
        }
    }
    Ok(())
}
