use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::database::DatabaseError;

/// One pledge joined to the pledging user, as returned by the supporter
/// listing query.
#[derive(Debug, Clone, FromRow)]
pub struct SupporterRow {
    pub id: i64,
    pub support_tier_id: i64,
    pub message: Option<String>,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub timestamp: DateTime<Utc>,
}

pub async fn for_petition(
    pool: &PgPool,
    petition_id: i64,
) -> Result<Vec<SupporterRow>, DatabaseError> {
    let rows = sqlx::query_as::<_, SupporterRow>(
        "SELECT s.id, s.support_tier_id, s.message, s.user_id,
                u.first_name, u.last_name, s.timestamp
         FROM supporters s
         JOIN users u ON s.user_id = u.id
         WHERE s.petition_id = $1
         ORDER BY s.timestamp DESC, s.id ASC",
    )
    .bind(petition_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn exists_for_petition(
    conn: &mut PgConnection,
    petition_id: i64,
) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM supporters WHERE petition_id = $1 LIMIT 1")
            .bind(petition_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.is_some())
}

/// Whether the user has already pledged at this exact tier.
pub async fn exists_for_tier_and_user(
    conn: &mut PgConnection,
    tier_id: i64,
    user_id: i64,
) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM supporters WHERE support_tier_id = $1 AND user_id = $2 LIMIT 1",
    )
    .bind(tier_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

/// Insert a pledge; the timestamp is assigned by the database.
pub async fn insert(
    conn: &mut PgConnection,
    petition_id: i64,
    tier_id: i64,
    user_id: i64,
    message: Option<&str>,
) -> Result<i64, DatabaseError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO supporters (petition_id, support_tier_id, user_id, message)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(petition_id)
    .bind(tier_id)
    .bind(user_id)
    .bind(message)
    .fetch_one(conn)
    .await?;
    Ok(id)
}
