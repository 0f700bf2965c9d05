use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::database::{self, models::user};
use crate::error::ApiError;

/// The session header carrying the opaque bearer token.
pub const AUTH_HEADER: &str = "x-authorization";

/// Authenticated user context resolved from the stored session token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    /// The presented token, kept so logout can clear exactly this session.
    pub token: String,
}

/// The caller's session, injected into every request. `None` covers both an
/// absent header and a token no stored session matches; handlers that demand
/// authentication go through [`MaybeUser::required`], which turns `None` into
/// Unauthorized before any ownership or business-rule check runs.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn required(&self) -> Result<&AuthUser, ApiError> {
        self.0
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized: a valid session token is required"))
    }
}

/// Resolve the session token against the users table and inject the caller's
/// identity. Applied to the whole router; anonymous requests skip the lookup.
pub async fn resolve_session(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = match token_from_headers(request.headers()) {
        Some(token) => resolve(&token).await?,
        None => None,
    };

    request.extensions_mut().insert(MaybeUser(auth_user));
    Ok(next.run(request).await)
}

async fn resolve(token: &str) -> Result<Option<AuthUser>, ApiError> {
    let pool = database::pool()?;
    let user = user::by_token(pool, token).await?;
    Ok(user.map(|u| AuthUser {
        id: u.id,
        email: u.email,
        token: token.to_string(),
    }))
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTH_HEADER)?.to_str().ok()?;
    if value.trim().is_empty() {
        return None;
    }
    Some(value.to_string())
}
