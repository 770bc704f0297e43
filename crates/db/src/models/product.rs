use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::search_term;

/// A product or service that can be billed on an invoice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: i64,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload. The older frontend still sends PascalCase keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Description")]
    pub description: Option<String>,
    #[serde(alias = "UnitPrice")]
    pub unit_price: Option<i64>,
    #[serde(alias = "Category")]
    pub category: Option<String>,
    #[serde(rename = "type", alias = "Type")]
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ProductSearch {
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, unit_price, category, product_type, created_at, updated_at";

impl Product {
    pub async fn search(pool: &SqlitePool, filter: &ProductSearch) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"SELECT {PRODUCT_COLUMNS}
               FROM products
               WHERE ($1 IS NULL OR name LIKE '%' || $1 || '%' OR description LIKE '%' || $1 || '%')
                 AND ($2 IS NULL OR category = $2)
                 AND ($3 IS NULL OR product_type = $3)
               ORDER BY name ASC"#
        ))
        .bind(search_term(filter.q.as_deref()))
        .bind(search_term(filter.category.as_deref()))
        .bind(search_term(filter.product_type.as_deref()))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        name: &str,
        unit_price: i64,
        data: &ProductPayload,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"INSERT INTO products (id, name, description, unit_price, category, product_type)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(id)
        .bind(name.trim())
        .bind(&data.description)
        .bind(unit_price)
        .bind(&data.category)
        .bind(&data.product_type)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &ProductPayload,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"UPDATE products
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   unit_price = COALESCE($4, unit_price),
                   category = COALESCE($5, category),
                   product_type = COALESCE($6, product_type),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(&data.description)
        .bind(data.unit_price)
        .bind(&data.category)
        .bind(&data.product_type)
        .fetch_optional(pool)
        .await
    }

    /// Deletes and returns the product, `None` if it did not exist.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
