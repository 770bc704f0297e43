use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::search_term;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    #[serde(default)]
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    pub name: Option<String>,
    pub contact: Option<String>,
}

const CLIENT_COLUMNS: &str = "id, name, contact, created_at, updated_at";

impl Client {
    /// All clients, or those whose name or contact contains `q`.
    pub async fn search(pool: &SqlitePool, q: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"SELECT {CLIENT_COLUMNS}
               FROM clients
               WHERE $1 IS NULL
                  OR name LIKE '%' || $1 || '%'
                  OR contact LIKE '%' || $1 || '%'
               ORDER BY name ASC"#
        ))
        .bind(search_term(q))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateClient,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"INSERT INTO clients (id, name, contact)
               VALUES ($1, $2, $3)
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.name.trim())
        .bind(&data.contact)
        .fetch_one(pool)
        .await
    }

    /// Returns `None` when no client has this id.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateClient,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(&format!(
            r#"UPDATE clients
               SET name = COALESCE($2, name),
                   contact = COALESCE($3, contact),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(&data.contact)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
