use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

pub async fn all(pool: &PgPool) -> Result<Vec<Category>, DatabaseError> {
    let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}
