use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};

use crate::database::{self, models::user};
use crate::error::ApiError;
use crate::middleware::MaybeUser;
use crate::storage;

/// GET /users/:id/image
pub async fn get_image(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let pool = database::pool()?;
    let filename = user::image_filename(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with the given id"))?
        .ok_or_else(|| ApiError::not_found("User has no image"))?;

    let bytes = storage::read(&filename)
        .await?
        .ok_or_else(|| ApiError::not_found("Image file not found"))?;

    Ok((
        [(header::CONTENT_TYPE, storage::content_type_for(&filename))],
        bytes,
    ))
}

/// POST /users/:id/image - raw image bytes; 201 when first set, 200 on replace
pub async fn set_image(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let account = user::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with the given id"))?;

    if auth.id != id {
        return Err(ApiError::forbidden("Only the account holder may set a profile image"));
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

    let filename = storage::save(&format!("user_{}", id), extension, &body).await?;
    user::set_image_filename(pool, id, Some(&filename)).await?;

    if let Some(old) = account.image_filename {
        if let Err(e) = storage::remove(&old).await {
            tracing::warn!("Failed to remove replaced image {}: {}", old, e);
        }
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::CREATED)
    }
}

/// DELETE /users/:id/image
pub async fn delete_image(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let account = user::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with the given id"))?;

    if auth.id != id {
        return Err(ApiError::forbidden(
            "Only the account holder may delete a profile image",
        ));
    }

    let filename = account
        .image_filename
        .ok_or_else(|| ApiError::not_found("User has no image"))?;

    user::set_image_filename(pool, id, None).await?;
    storage::remove(&filename).await?;

    Ok(StatusCode::OK)
}
