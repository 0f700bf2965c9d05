use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::database::DatabaseError;
use crate::filter::bind::bind_query;

/// A petition carries between one and three of these.
#[derive(Debug, Clone, FromRow)]
pub struct SupportTier {
    pub id: i64,
    pub petition_id: i64,
    pub title: String,
    pub description: String,
    pub cost: i64,
}

/// Optional tier fields for a PATCH; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct SupportTierChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
}

impl SupportTierChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.cost.is_none()
    }
}

pub async fn for_petition(
    pool: &PgPool,
    petition_id: i64,
) -> Result<Vec<SupportTier>, DatabaseError> {
    let rows = sqlx::query_as::<_, SupportTier>(
        "SELECT id, petition_id, title, description, cost
         FROM support_tiers WHERE petition_id = $1 ORDER BY id",
    )
    .bind(petition_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch a tier, scoped to its petition so a tier id from another petition
/// resolves to None.
pub async fn by_id(
    pool: &PgPool,
    petition_id: i64,
    tier_id: i64,
) -> Result<Option<SupportTier>, DatabaseError> {
    let row = sqlx::query_as::<_, SupportTier>(
        "SELECT id, petition_id, title, description, cost
         FROM support_tiers WHERE id = $1 AND petition_id = $2",
    )
    .bind(tier_id)
    .bind(petition_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn count_for_petition(
    conn: &mut PgConnection,
    petition_id: i64,
) -> Result<i64, DatabaseError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM support_tiers WHERE petition_id = $1")
            .bind(petition_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}

pub async fn title_in_use(
    conn: &mut PgConnection,
    petition_id: i64,
    title: &str,
    exclude_tier: Option<i64>,
) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> = match exclude_tier {
        Some(id) => {
            sqlx::query_as(
                "SELECT id FROM support_tiers
                 WHERE petition_id = $1 AND title = $2 AND id <> $3",
            )
            .bind(petition_id)
            .bind(title)
            .bind(id)
            .fetch_optional(conn)
            .await?
        }
        None => {
            sqlx::query_as("SELECT id FROM support_tiers WHERE petition_id = $1 AND title = $2")
                .bind(petition_id)
                .bind(title)
                .fetch_optional(conn)
                .await?
        }
    };
    Ok(row.is_some())
}

pub async fn insert(
    conn: &mut PgConnection,
    petition_id: i64,
    title: &str,
    description: &str,
    cost: i64,
) -> Result<i64, DatabaseError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO support_tiers (petition_id, title, description, cost)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(petition_id)
    .bind(title)
    .bind(description)
    .bind(cost)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Apply the provided fields only; the SET list is assembled dynamically.
pub async fn update(
    conn: &mut PgConnection,
    tier_id: i64,
    changes: &SupportTierChanges,
) -> Result<(), DatabaseError> {
    let mut parts: Vec<String> = vec![];
    let mut params: Vec<Value> = vec![];

    if let Some(ref title) = changes.title {
        params.push(Value::String(title.clone()));
        parts.push(format!("title = ${}", params.len()));
    }
    if let Some(ref description) = changes.description {
        params.push(Value::String(description.clone()));
        parts.push(format!("description = ${}", params.len()));
    }
    if let Some(cost) = changes.cost {
        params.push(Value::from(cost));
        parts.push(format!("cost = ${}", params.len()));
    }

    params.push(Value::from(tier_id));
    let sql = format!(
        "UPDATE support_tiers SET {} WHERE id = ${}",
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

pub async fn delete(conn: &mut PgConnection, tier_id: i64) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM support_tiers WHERE id = $1")
        .bind(tier_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn has_supporters(
    conn: &mut PgConnection,
    tier_id: i64,
) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM supporters WHERE support_tier_id = $1 LIMIT 1")
            .bind(tier_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.is_some())
}
