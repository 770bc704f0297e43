use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64, // quantity * unit_price
    pub purchase_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Line item as sent by the frontend, before product defaults are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceItem {
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
    pub purchase_location: Option<String>,
    pub product_id: Option<Uuid>,
}

/// Fully resolved line item ready for insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoiceItem {
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub purchase_location: Option<String>,
}

impl NewInvoiceItem {
    pub fn line_total(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }
}

const ITEM_COLUMNS: &str = "id, invoice_id, product_id, description, quantity, unit_price, \
     line_total, purchase_location, created_at";

impl InvoiceItem {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        invoice_id: Uuid,
        data: &NewInvoiceItem,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, InvoiceItem>(&format!(
            r#"INSERT INTO invoice_items (id, invoice_id, product_id, description, quantity,
                                         unit_price, line_total, purchase_location)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {ITEM_COLUMNS}"#
        ))
        .bind(id)
        .bind(invoice_id)
        .bind(data.product_id)
        .bind(&data.description)
        .bind(data.quantity)
        .bind(data.unit_price)
        .bind(data.line_total())
        .bind(&data.purchase_location)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_invoice_id<'e, E>(
        executor: E,
        invoice_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, InvoiceItem>(&format!(
            r#"SELECT {ITEM_COLUMNS}
               FROM invoice_items
               WHERE invoice_id = $1
               ORDER BY created_at ASC, rowid ASC"#
        ))
        .bind(invoice_id)
        .fetch_all(executor)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invoice_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
