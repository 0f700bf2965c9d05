use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool, Row};

use crate::database::DatabaseError;
use crate::filter::bind::{bind_query, bind_query_as};
use crate::filter::PetitionFilter;

#[derive(Debug, Clone, FromRow)]
pub struct Petition {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub creation_date: DateTime<Utc>,
    pub image_filename: Option<String>,
}

/// One row of the filtered listing query (petition joined to its owner,
/// plus the computed supporter count and minimum tier cost).
#[derive(Debug, Clone, FromRow)]
pub struct PetitionSummary {
    pub id: i64,
    pub title: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: DateTime<Utc>,
    pub supporting_cost: i64,
}

/// The single-petition detail row; tiers are fetched separately.
#[derive(Debug, Clone, FromRow)]
pub struct PetitionDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: DateTime<Utc>,
    pub money_raised: i64,
}

/// Optional petition fields for a PATCH; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct PetitionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

impl PetitionChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.category_id.is_none()
    }
}

/// Run the listing query and its companion count statement. The count is the
/// size of the filtered set before pagination.
pub async fn search(
    pool: &PgPool,
    filter: &PetitionFilter,
) -> Result<(Vec<PetitionSummary>, i64), DatabaseError> {
    let select = filter.to_select_sql();
    let mut q = sqlx::query_as::<_, PetitionSummary>(&select.query);
    for p in select.params.iter() {
        q = bind_query_as(q, p);
    }
    let rows = q.fetch_all(pool).await?;

    let count = filter.to_count_sql();
    let mut q = sqlx::query(&count.query);
    for p in count.params.iter() {
        q = bind_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    let total: i64 = row.try_get("total")?;

    Ok((rows, total))
}

pub async fn by_id(pool: &PgPool, id: i64) -> Result<Option<Petition>, DatabaseError> {
    let row = sqlx::query_as::<_, Petition>(
        "SELECT id, title, description, category_id, owner_id, creation_date, image_filename
         FROM petitions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn detail(pool: &PgPool, id: i64) -> Result<Option<PetitionDetail>, DatabaseError> {
    let row = sqlx::query_as::<_, PetitionDetail>(
        "SELECT p.id, p.title, p.description, p.category_id, p.owner_id,
                u.first_name AS owner_first_name, u.last_name AS owner_last_name,
                (SELECT COUNT(*) FROM supporters s
                   WHERE s.petition_id = p.id) AS number_of_supporters,
                p.creation_date,
                COALESCE((SELECT SUM(t.cost) FROM supporters s
                            JOIN support_tiers t ON s.support_tier_id = t.id
                           WHERE s.petition_id = p.id), 0)::BIGINT AS money_raised
         FROM petitions p
         JOIN users u ON p.owner_id = u.id
         WHERE p.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn title_in_use(
    pool: &PgPool,
    title: &str,
    exclude_petition: Option<i64>,
) -> Result<bool, DatabaseError> {
    let row: Option<(i64,)> = match exclude_petition {
        Some(id) => {
            sqlx::query_as("SELECT id FROM petitions WHERE title = $1 AND id <> $2")
                .bind(title)
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id FROM petitions WHERE title = $1")
                .bind(title)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(row.is_some())
}

pub async fn insert(
    conn: &mut PgConnection,
    title: &str,
    description: &str,
    category_id: i64,
    owner_id: i64,
) -> Result<i64, DatabaseError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO petitions (title, description, category_id, owner_id)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(title)
    .bind(description)
    .bind(category_id)
    .bind(owner_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Apply the provided fields only; the SET list is assembled dynamically.
pub async fn update(
    conn: &mut PgConnection,
    id: i64,
    changes: &PetitionChanges,
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
    if let Some(category_id) = changes.category_id {
        params.push(Value::from(category_id));
        parts.push(format!("category_id = ${}", params.len()));
    }

    params.push(Value::from(id));
    let sql = format!(
        "UPDATE petitions SET {} WHERE id = ${}",
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

/// Delete the petition row; its tiers go with it via ON DELETE CASCADE.
pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM petitions WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn image_filename(pool: &PgPool, id: i64) -> Result<Option<Option<String>>, DatabaseError> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT image_filename FROM petitions WHERE id = $1")
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
    sqlx::query("UPDATE petitions SET image_filename = $1 WHERE id = $2")
        .bind(filename)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
