use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::database::DatabaseError;
use crate::filter::bind::bind_query;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub auth_token: Option<String>,
    pub image_filename: Option<String>,
}

/// Optional profile fields for a PATCH; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password.is_none()
    }
}

const COLUMNS: &str = "id, email, first_name, last_name, password, auth_token, image_filename";

pub async fn insert(
    pool: &PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    password_hash: &str,
) -> Result<i64, DatabaseError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (email, first_name, last_name, password)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn by_id(pool: &PgPool, id: i64) -> Result<Option<User>, DatabaseError> {
    let row = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// The authentication resolver: map a bearer token to its user, if any.
pub async fn by_token(pool: &PgPool, token: &str) -> Result<Option<User>, DatabaseError> {
    let row =
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE auth_token = $1"))
            .bind(token)
            .fetch_optional(pool)
            .await?;
    Ok(row)
}

/// Store the freshly minted session token; replaces any previous session.
pub async fn set_token(pool: &PgPool, id: i64, token: &str) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET auth_token = $1 WHERE id = $2")
        .bind(token)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_token(pool: &PgPool, token: &str) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET auth_token = NULL WHERE auth_token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn email_in_use(
    pool: &PgPool,
    email: &str,
    exclude_user: Option<i64>,
) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> = match exclude_user {
        Some(id) => {
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(row.is_some())
}

/// Apply the provided fields only; the SET list is assembled dynamically.
pub async fn update(
    conn: &mut PgConnection,
    id: i64,
    changes: &UserChanges,
) -> Result<(), DatabaseError> {
    let mut parts: Vec<String> = vec![];
    let mut params: Vec<Value> = vec![];

    if let Some(ref email) = changes.email {
        params.push(Value::String(email.clone()));
        parts.push(format!("email = ${}", params.len()));
    }
    if let Some(ref first_name) = changes.first_name {
        params.push(Value::String(first_name.clone()));
        parts.push(format!("first_name = ${}", params.len()));
    }
    if let Some(ref last_name) = changes.last_name {
        params.push(Value::String(last_name.clone()));
        parts.push(format!("last_name = ${}", params.len()));
    }
    if let Some(ref password_hash) = changes.password {
        params.push(Value::String(password_hash.clone()));
        parts.push(format!("password = ${}", params.len()));
    }

    params.push(Value::from(id));
    let sql = format!(
        "UPDATE users SET {} WHERE id = ${}",
        parts.join(", "),
        params.len()
    );

    let mut q = sqlx::query(&sql);
    for p in params.iter() {
        q = bind_query(q, p);
    }
    q.execute(conn).await?;
    Ok(())
}

pub async fn image_filename(pool: &PgPool, id: i64) -> Result<Option<Option<String>>, DatabaseError> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT image_filename FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(filename,)| filename))
}

pub async fn set_image_filename(
    pool: &PgPool,
    id: i64,
    filename: Option<&str>,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET image_filename = $1 WHERE id = $2")
        .bind(filename)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
