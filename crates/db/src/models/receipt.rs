use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A payment recorded against an invoice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub invoice_code: String,
    pub receipt_date: NaiveDate,
    pub amount: i64,
    pub method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceipt {
    pub amount: Option<i64>,
    pub method: Option<String>,
    pub notes: Option<String>,
    pub receipt_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceipt {
    pub amount: Option<i64>,
    pub method: Option<String>,
    pub notes: Option<String>,
}

const RECEIPT_SELECT: &str = r#"SELECT r.id, r.invoice_id, i.invoice_code, r.receipt_date, r.amount,
       r.method, r.notes, r.created_at, r.updated_at
  FROM receipts r
  JOIN invoices i ON i.id = r.invoice_id"#;

impl Receipt {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Receipt>(&format!(
            "{RECEIPT_SELECT} ORDER BY r.receipt_date DESC, r.created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Receipt>(&format!("{RECEIPT_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_invoice_id(
        pool: &SqlitePool,
        invoice_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Receipt>(&format!(
            "{RECEIPT_SELECT} WHERE r.invoice_id = $1 ORDER BY r.receipt_date ASC, r.created_at ASC"
        ))
        .bind(invoice_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        invoice_id: Uuid,
        receipt_date: NaiveDate,
        amount: i64,
        data: &CreateReceipt,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO receipts (id, invoice_id, receipt_date, amount, method, notes)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(id)
        .bind(invoice_id)
        .bind(receipt_date)
        .bind(amount)
        .bind(&data.method)
        .bind(&data.notes)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Returns `None` when no receipt has this id.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        amount: i64,
        data: &UpdateReceipt,
    ) -> Result<Option<Self>, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE receipts
               SET amount = $2,
                   method = COALESCE($3, method),
                   notes = COALESCE($4, notes),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(amount)
        .bind(&data.method)
        .bind(&data.notes)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM receipts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
