use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::search_term;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    pub nim: Option<String>, // Registration number, unique when present
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub staff_type: Option<String>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaff {
    #[serde(default)]
    pub name: String,
    pub nim: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub staff_type: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaff {
    pub name: Option<String>,
    pub nim: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub staff_type: Option<String>,
    pub contact: Option<String>,
}

const STAFF_COLUMNS: &str =
    "id, name, nim, role, staff_type, contact, created_at, updated_at";

fn normalize_nim(nim: Option<&str>) -> Option<String> {
    nim.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string)
}

impl Staff {
    pub async fn search(pool: &SqlitePool, q: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"SELECT {STAFF_COLUMNS}
               FROM staff
               WHERE $1 IS NULL
                  OR name LIKE '%' || $1 || '%'
                  OR nim LIKE '%' || $1 || '%'
                  OR role LIKE '%' || $1 || '%'
               ORDER BY name ASC"#
        ))
        .bind(search_term(q))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_nim<'e, E>(executor: E, nim: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Staff>(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE nim = $1"))
            .bind(nim.trim())
            .fetch_optional(executor)
            .await
    }

    /// Fails with a unique violation when the NIM is already taken.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateStaff,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"INSERT INTO staff (id, name, nim, role, staff_type, contact)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {STAFF_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.name.trim())
        .bind(normalize_nim(data.nim.as_deref()))
        .bind(&data.role)
        .bind(&data.staff_type)
        .bind(&data.contact)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateStaff,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"UPDATE staff
               SET name = COALESCE($2, name),
                   nim = COALESCE($3, nim),
                   role = COALESCE($4, role),
                   staff_type = COALESCE($5, staff_type),
                   contact = COALESCE($6, contact),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {STAFF_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(normalize_nim(data.nim.as_deref()))
        .bind(&data.role)
        .bind(&data.staff_type)
        .bind(&data.contact)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
