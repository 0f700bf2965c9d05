use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_token, passwords, Claims};
use crate::database::{self, models::user};
use crate::error::ApiError;
use crate::middleware::MaybeUser;

use super::{validate_email, validate_name, validate_password};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
}

/// POST /users/register
pub async fn register(Json(req): Json<RegisterRequest>) -> Result<impl IntoResponse, ApiError> {
    validate_email(&req.email)?;
    validate_name(&req.first_name, "firstName")?;
    validate_name(&req.last_name, "lastName")?;
    validate_password(&req.password)?;

    let pool = database::pool()?;
    if user::email_in_use(pool, &req.email, None).await? {
        return Err(ApiError::forbidden("Email already in use"));
    }

    let password_hash = passwords::hash(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    let user_id = user::insert(pool, &req.email, &req.first_name, &req.last_name, &password_hash)
        .await?;
    tracing::info!("Registered user {} ({})", user_id, req.email);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: i64,
    pub token: String,
}

/// POST /users/login
pub async fn login(Json(req): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    validate_email(&req.email)?;

    let pool = database::pool()?;
    let account = user::by_email(pool, &req.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Incorrect email or password"))?;

    if !passwords::verify(&req.password, &account.password) {
        return Err(ApiError::unauthorized("Incorrect email or password"));
    }

    // Minting a new token replaces any previous session for this user
    let token = generate_token(Claims::new(account.id, account.email.clone()))?;
    user::set_token(pool, account.id, &token).await?;

    Ok(Json(LoginResponse {
        user_id: account.id,
        token,
    }))
}

/// POST /users/logout
pub async fn logout(Extension(session): Extension<MaybeUser>) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    user::clear_token(pool, &auth.token).await?;

    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// GET /users/:id - email is included only when the caller views themself
pub async fn view(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = database::pool()?;
    let account = user::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with the given id"))?;

    let is_self = session.0.as_ref().is_some_and(|auth| auth.id == id);
    Ok(Json(ProfileResponse {
        email: is_self.then_some(account.email),
        first_name: account.first_name,
        last_name: account.last_name,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

/// PATCH /users/:id - self only; a password change requires the current one
pub async fn update(
    Path(id): Path<i64>,
    Extension(session): Extension<MaybeUser>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = session.required()?;

    let pool = database::pool()?;
    let account = user::by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with the given id"))?;

    if auth.id != id {
        return Err(ApiError::forbidden("Only the account holder may edit a profile"));
    }

    if req.email.is_none()
        && req.first_name.is_none()
        && req.last_name.is_none()
        && req.password.is_none()
    {
        return Err(ApiError::bad_request("No fields provided to update"));
    }

    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    if let Some(ref first_name) = req.first_name {
        validate_name(first_name, "firstName")?;
    }
    if let Some(ref last_name) = req.last_name {
        validate_name(last_name, "lastName")?;
    }

    let mut password_hash = None;
    if let Some(ref password) = req.password {
        validate_password(password)?;
        let current = req
            .current_password
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("currentPassword is required to change password"))?;
        if !passwords::verify(current, &account.password) {
            return Err(ApiError::unauthorized("Incorrect currentPassword"));
        }
        if password.as_str() == current {
            return Err(ApiError::forbidden(
                "New password must differ from the current password",
            ));
        }
        password_hash = Some(passwords::hash(password).map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?);
    }

    if let Some(ref email) = req.email {
        if user::email_in_use(pool, email, Some(id)).await? {
            return Err(ApiError::forbidden("Email already in use"));
        }
    }

    let changes = user::UserChanges {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password: password_hash,
    };

    let mut tx = pool.begin().await?;
    user::update(&mut *tx, id, &changes).await?;
    tx.commit().await?;

    Ok(StatusCode::OK)
}
