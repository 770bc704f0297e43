use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Letter recording that a staff member handed over the work for an invoice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HandoverLetter {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub invoice_code: String,
    pub staff_id: Option<Uuid>,
    pub staff_nim: Option<String>,
    pub staff_name: Option<String>,
    pub letter_date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateHandoverLetter {
    pub invoice_code: Option<String>,
    #[serde(alias = "staffNIM")]
    pub staff_nim: Option<String>,
    pub description: Option<String>,
    pub letter_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHandoverLetter {
    pub letter_date: Option<NaiveDate>,
    #[serde(alias = "staffNIM")]
    pub staff_nim: Option<String>,
    pub description: Option<String>,
}

const HANDOVER_SELECT: &str = r#"SELECT h.id, h.invoice_id, i.invoice_code, h.staff_id,
       s.nim AS staff_nim, s.name AS staff_name, h.letter_date, h.description,
       h.created_at, h.updated_at
  FROM handover_letters h
  JOIN invoices i ON i.id = h.invoice_id
  LEFT JOIN staff s ON s.id = h.staff_id"#;

impl HandoverLetter {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, HandoverLetter>(&format!("{HANDOVER_SELECT} WHERE h.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_invoice_id(
        pool: &SqlitePool,
        invoice_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, HandoverLetter>(&format!(
            "{HANDOVER_SELECT} WHERE h.invoice_id = $1 ORDER BY h.letter_date ASC, h.created_at ASC"
        ))
        .bind(invoice_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        invoice_id: Uuid,
        staff_id: Uuid,
        letter_date: NaiveDate,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO handover_letters (id, invoice_id, staff_id, letter_date, description)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(invoice_id)
        .bind(staff_id)
        .bind(letter_date)
        .bind(description)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Returns false when no letter has this id.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        letter_date: Option<NaiveDate>,
        staff_id: Option<Uuid>,
        description: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE handover_letters
               SET letter_date = COALESCE($2, letter_date),
                   staff_id = COALESCE($3, staff_id),
                   description = COALESCE($4, description),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(letter_date)
        .bind(staff_id)
        .bind(description)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM handover_letters WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
