use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};

use crate::database::{self, models::petition};
use crate::error::ApiError;
use crate::middleware::MaybeUser;
use crate::storage;

/// GET /petitions/:id/image
pub async fn get_image(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let pool = database::pool()?;
    let filename = petition::image_filename(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?
        .ok_or_else(|| ApiError::not_found("Petition has no image"))?;

    let bytes = storage::read(&filename)
        .await?
        .ok_or_else(|| ApiError::not_found("Image file not found"))?;

    Ok((
        [(header::CONTENT_TYPE, storage::content_type_for(&filename))],
        bytes,
    ))
}

/// POST /petitions/:id/image - owner only; 201 when first set, 200 on replace
pub async fn set_image(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden("Only the owner may set a petition image"));
    }

    let extension = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(storage::extension_for)
        .ok_or_else(|| {
            ApiError::bad_request("Content-Type must be image/png, image/jpeg or image/gif")
        })?;

    // Oversize bodies are already rejected by the router's body limit
    if body.is_empty() {
        return Err(ApiError::bad_request("Image body must not be empty"));
    }

    let filename = storage::save(&format!("petition_{}", id), extension, &body).await?;
    petition::set_image_filename(pool, id, Some(&filename)).await?;

    if let Some(old) = found.image_filename {
        if let Err(e) = storage::remove(&old).await {
            tracing::warn!("Failed to remove replaced image {}: {}", old, e);
        }
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::CREATED)
    }
}

/// DELETE /petitions/:id/image
pub async fn delete_image(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let found = petition::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No petition with the given id"))?;

    if found.owner_id != auth.id {
        return Err(ApiError::forbidden(
            "Only the owner may delete a petition image",
        ));
    }

    let filename = found
        .image_filename
        .ok_or_else(|| ApiError::not_found("Petition has no image"))?;

    petition::set_image_filename(pool, id, None).await?;
    storage::remove(&filename).await?;

    Ok(StatusCode::OK)
}
