use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{invoice_item::CreateInvoiceItem, search_term};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "invoice_status")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_code: String, // FOLKS/TYPE/MM/NNN
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub down_payment_amount: i64,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice header joined with party names and money totals.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client_name: Option<String>,
    pub staff_name: Option<String>,
    pub subtotal: i64,
    pub total_due: i64,
    pub receipts_total: i64,
    pub balance: i64,
}

impl std::ops::Deref for InvoiceSummary {
    type Target = Invoice;
    fn deref(&self) -> &Self::Target {
        &self.invoice
    }
}

/// Header fields written on insert. The code is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_code: String,
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub down_payment_amount: i64,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
}

/// Request body for a new invoice; `items` is absent for empty invoices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub invoice_type: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub down_payment_amount: Option<i64>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
    pub items: Option<Vec<CreateInvoiceItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvoice {
    pub invoice_id: Uuid,
    pub invoice_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceHeader {
    pub invoice_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub down_payment_amount: Option<i64>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct InvoiceSearch {
    pub q: Option<String>,
    pub status: Option<InvoiceStatus>,
    #[serde(rename = "type")]
    pub invoice_type: Option<String>,
}

const INVOICE_COLUMNS: &str = "id, invoice_code, invoice_type, invoice_date, client_id, staff_id, \
     down_payment_amount, status, notes, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"SELECT t.*,
       t.subtotal - t.down_payment_amount                   AS total_due,
       t.subtotal - t.down_payment_amount - t.receipts_total AS balance
  FROM (
    SELECT i.id, i.invoice_code, i.invoice_type, i.invoice_date, i.client_id, i.staff_id,
           i.down_payment_amount, i.status, i.notes, i.created_at, i.updated_at,
           c.name AS client_name,
           s.name AS staff_name,
           COALESCE((SELECT SUM(it.line_total) FROM invoice_items it WHERE it.invoice_id = i.id), 0) AS subtotal,
           COALESCE((SELECT SUM(r.amount) FROM receipts r WHERE r.invoice_id = i.id), 0) AS receipts_total
      FROM invoices i
      LEFT JOIN clients c ON c.id = i.client_id
      LEFT JOIN staff s ON s.id = i.staff_id
  ) t"#;

impl Invoice {
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_code<'e, E>(executor: E, code: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_code = $1"
        ))
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// Every code starting with `prefix`. Callers pass an ASCII prefix without LIKE wildcards.
    pub async fn codes_with_prefix<'e, E>(executor: E, prefix: &str) -> Result<Vec<String>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, String>(
            "SELECT invoice_code FROM invoices WHERE invoice_code LIKE $1 || '%'",
        )
        .bind(prefix)
        .fetch_all(executor)
        .await
    }

    pub async fn create<'e, E>(executor: E, id: Uuid, data: &NewInvoice) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"INSERT INTO invoices (id, invoice_code, invoice_type, invoice_date, client_id, staff_id,
                                    down_payment_amount, status, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.invoice_code)
        .bind(&data.invoice_type)
        .bind(data.invoice_date)
        .bind(data.client_id)
        .bind(data.staff_id)
        .bind(data.down_payment_amount)
        .bind(data.status)
        .bind(&data.notes)
        .fetch_one(executor)
        .await
    }

    /// Partial header update; absent fields keep their value.
    pub async fn update_header<'e, E>(
        executor: E,
        code: &str,
        data: &UpdateInvoiceHeader,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"UPDATE invoices
               SET invoice_date = COALESCE($2, invoice_date),
                   client_id = COALESCE($3, client_id),
                   staff_id = COALESCE($4, staff_id),
                   down_payment_amount = COALESCE($5, down_payment_amount),
                   status = COALESCE($6, status),
                   notes = COALESCE($7, notes),
                   updated_at = datetime('now', 'subsec')
               WHERE invoice_code = $1
               RETURNING {INVOICE_COLUMNS}"#
        ))
        .bind(code)
        .bind(data.invoice_date)
        .bind(data.client_id)
        .bind(data.staff_id)
        .bind(data.down_payment_amount)
        .bind(data.status)
        .bind(&data.notes)
        .fetch_optional(executor)
        .await
    }

    /// Items, receipts and handover letters go with it (ON DELETE CASCADE).
    pub async fn delete_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&format!(
            "DELETE FROM invoices WHERE invoice_code = $1 RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(code)
        .fetch_optional(pool)
        .await
    }
}

impl InvoiceSummary {
    pub async fn find_by_code<'e, E>(executor: E, code: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, InvoiceSummary>(&format!("{SUMMARY_SELECT} WHERE t.invoice_code = $1"))
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    /// Newest first. `q` matches the code, client name or notes.
    pub async fn search(pool: &SqlitePool, filter: &InvoiceSearch) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceSummary>(&format!(
            r#"{SUMMARY_SELECT}
               WHERE ($1 IS NULL
                      OR t.invoice_code LIKE '%' || $1 || '%'
                      OR t.client_name LIKE '%' || $1 || '%'
                      OR t.notes LIKE '%' || $1 || '%')
                 AND ($2 IS NULL OR t.status = $2)
                 AND ($3 IS NULL OR t.invoice_type = UPPER($3))
               ORDER BY t.invoice_date DESC, t.invoice_code DESC"#
        ))
        .bind(search_term(filter.q.as_deref()))
        .bind(filter.status)
        .bind(search_term(filter.invoice_type.as_deref()))
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn new_invoice(code: &str, date: NaiveDate) -> NewInvoice {
        NewInvoice {
            invoice_code: code.to_string(),
            invoice_type: "INV".to_string(),
            invoice_date: date,
            client_id: None,
            staff_id: None,
            down_payment_amount: 0,
            status: InvoiceStatus::Draft,
            notes: None,
        }
    }

    #[tokio::test]
    async fn codes_with_prefix_only_returns_matching_codes() {
        let db = DBService::new_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
        for code in ["FOLKS/INV/08/001", "FOLKS/INV/08/002", "FOLKS/INV/09/001", "FOLKS/DP/08/001"] {
            Invoice::create(&db.pool, Uuid::new_v4(), &new_invoice(code, date))
                .await
                .unwrap();
        }

        let mut codes = Invoice::codes_with_prefix(&db.pool, "FOLKS/INV/08/")
            .await
            .unwrap();
        codes.sort();
        assert_eq!(codes, vec!["FOLKS/INV/08/001", "FOLKS/INV/08/002"]);
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let db = DBService::new_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
        Invoice::create(&db.pool, Uuid::new_v4(), &new_invoice("FOLKS/INV/08/001", date))
            .await
            .unwrap();
        let err = Invoice::create(&db.pool, Uuid::new_v4(), &new_invoice("FOLKS/INV/08/001", date))
            .await
            .unwrap_err();
        assert!(err.as_database_error().unwrap().is_unique_violation());
    }

    #[tokio::test]
    async fn summary_of_empty_invoice_has_zero_totals() {
        let db = DBService::new_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
        let mut data = new_invoice("FOLKS/INV/08/001", date);
        data.down_payment_amount = 0;
        Invoice::create(&db.pool, Uuid::new_v4(), &data).await.unwrap();

        let summary = InvoiceSummary::find_by_code(&db.pool, "FOLKS/INV/08/001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.subtotal, 0);
        assert_eq!(summary.balance, 0);
        assert_eq!(summary.status, InvoiceStatus::Draft);
        assert!(summary.client_name.is_none());
    }

    #[tokio::test]
    async fn update_header_changes_only_given_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
        let mut data = new_invoice("FOLKS/INV/08/001", date);
        data.notes = Some("Pentas HUT".to_string());
        Invoice::create(&db.pool, Uuid::new_v4(), &data).await.unwrap();

        let changes = UpdateInvoiceHeader {
            status: Some(InvoiceStatus::Sent),
            ..Default::default()
        };
        let updated = Invoice::update_header(&db.pool, "FOLKS/INV/08/001", &changes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, InvoiceStatus::Sent);
        assert_eq!(updated.notes.as_deref(), Some("Pentas HUT"));
        assert_eq!(updated.invoice_date, date);

        let missing = Invoice::update_header(&db.pool, "FOLKS/INV/08/999", &changes)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(InvoiceStatus::Paid.to_string(), "Paid");
        assert_eq!("Cancelled".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Cancelled);
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Draft).unwrap(),
            r#""Draft""#
        );
    }
}
