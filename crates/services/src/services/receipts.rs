use chrono::{Local, NaiveDate};
use db::models::{
    invoice::{Invoice, InvoiceStatus},
    receipt::{CreateReceipt, Receipt, UpdateReceipt},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invoice not found")]
    InvoiceNotFound,
    #[error("invoiceCode is required")]
    MissingInvoiceCode,
    #[error("Receipt not found")]
    NotFound,
    #[error("Amount must be > 0")]
    InvalidAmount,
    #[error("Cannot record a receipt on a cancelled invoice")]
    InvoiceCancelled,
}

/// Receipt addressed by invoice code instead of id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptByCode {
    pub invoice_code: Option<String>,
    #[serde(flatten)]
    pub receipt: CreateReceipt,
}

fn positive_amount(amount: Option<i64>) -> Result<i64, ReceiptError> {
    match amount {
        Some(a) if a > 0 => Ok(a),
        _ => Err(ReceiptError::InvalidAmount),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct ReceiptService {
    pool: SqlitePool,
}

impl ReceiptService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All receipts, or those of one invoice when `code` is given.
    pub async fn list(&self, code: Option<&str>) -> Result<Vec<Receipt>, ReceiptError> {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let invoice = Invoice::find_by_code(&self.pool, code)
                    .await?
                    .ok_or(ReceiptError::InvoiceNotFound)?;
                Ok(Receipt::find_by_invoice_id(&self.pool, invoice.id).await?)
            }
            None => Ok(Receipt::find_all(&self.pool).await?),
        }
    }

    pub async fn create_for_invoice(
        &self,
        invoice_id: Uuid,
        data: &CreateReceipt,
    ) -> Result<Receipt, ReceiptError> {
        let amount = positive_amount(data.amount)?;
        let invoice = Invoice::find_by_id(&self.pool, invoice_id)
            .await?
            .ok_or(ReceiptError::InvoiceNotFound)?;
        self.record(&invoice, amount, data).await
    }

    pub async fn create_by_code(&self, data: &CreateReceiptByCode) -> Result<Receipt, ReceiptError> {
        let code = data
            .invoice_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ReceiptError::MissingInvoiceCode)?;
        let amount = positive_amount(data.receipt.amount)?;
        let invoice = Invoice::find_by_code(&self.pool, code)
            .await?
            .ok_or(ReceiptError::InvoiceNotFound)?;
        self.record(&invoice, amount, &data.receipt).await
    }

    async fn record(
        &self,
        invoice: &Invoice,
        amount: i64,
        data: &CreateReceipt,
    ) -> Result<Receipt, ReceiptError> {
        if invoice.status == InvoiceStatus::Cancelled {
            return Err(ReceiptError::InvoiceCancelled);
        }
        let receipt_date = data.receipt_date.unwrap_or_else(today);
        let receipt = Receipt::create(
            &self.pool,
            Uuid::new_v4(),
            invoice.id,
            receipt_date,
            amount,
            data,
        )
        .await?;
        info!(invoice_code = %invoice.invoice_code, amount, "Recorded receipt");
        Ok(receipt)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateReceipt) -> Result<Receipt, ReceiptError> {
        let amount = positive_amount(data.amount)?;
        Receipt::update(&self.pool, id, amount, data)
            .await?
            .ok_or(ReceiptError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ReceiptError> {
        if Receipt::delete(&self.pool, id).await? == 0 {
            return Err(ReceiptError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::invoice::{NewInvoice, UpdateInvoiceHeader},
    };

    use super::*;

    async fn seed_invoice(db: &DBService, code: &str) -> Invoice {
        Invoice::create(
            &db.pool,
            Uuid::new_v4(),
            &NewInvoice {
                invoice_code: code.to_string(),
                invoice_type: "INV".to_string(),
                invoice_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                client_id: None,
                staff_id: None,
                down_payment_amount: 0,
                status: InvoiceStatus::Draft,
                notes: None,
            },
        )
        .await
        .unwrap()
    }

    fn receipt(amount: i64) -> CreateReceipt {
        CreateReceipt {
            amount: Some(amount),
            method: Some("Transfer".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn by_code_payload_is_flat() {
        let payload: CreateReceiptByCode = serde_json::from_str(
            r#"{"invoiceCode": "FOLKS/INV/08/001", "amount": 50000, "receiptDate": "2025-08-03"}"#,
        )
        .unwrap();
        assert_eq!(payload.invoice_code.as_deref(), Some("FOLKS/INV/08/001"));
        assert_eq!(payload.receipt.amount, Some(50_000));
        assert_eq!(
            payload.receipt.receipt_date,
            NaiveDate::from_ymd_opt(2025, 8, 3)
        );
    }

    #[tokio::test]
    async fn amount_must_be_positive() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = ReceiptService::new(db.pool.clone());
        let invoice = seed_invoice(&db, "FOLKS/INV/08/001").await;

        for amount in [0, -10] {
            assert!(matches!(
                service.create_for_invoice(invoice.id, &receipt(amount)).await,
                Err(ReceiptError::InvalidAmount)
            ));
        }
        assert!(matches!(
            service
                .create_for_invoice(invoice.id, &CreateReceipt::default())
                .await,
            Err(ReceiptError::InvalidAmount)
        ));
    }

    #[tokio::test]
    async fn create_by_code_and_list() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = ReceiptService::new(db.pool.clone());
        seed_invoice(&db, "FOLKS/INV/08/001").await;
        let other = seed_invoice(&db, "FOLKS/INV/08/002").await;

        let created = service
            .create_by_code(&CreateReceiptByCode {
                invoice_code: Some(" FOLKS/INV/08/001 ".to_string()),
                receipt: receipt(75_000),
            })
            .await
            .unwrap();
        assert_eq!(created.invoice_code, "FOLKS/INV/08/001");
        assert_eq!(created.receipt_date, today());
        service
            .create_for_invoice(other.id, &receipt(10_000))
            .await
            .unwrap();

        assert_eq!(service.list(None).await.unwrap().len(), 2);
        let for_first = service.list(Some("FOLKS/INV/08/001")).await.unwrap();
        assert_eq!(for_first.len(), 1);
        assert_eq!(for_first[0].amount, 75_000);
        assert!(matches!(
            service.list(Some("FOLKS/INV/08/404")).await,
            Err(ReceiptError::InvoiceNotFound)
        ));
        assert!(matches!(
            service.create_by_code(&CreateReceiptByCode::default()).await,
            Err(ReceiptError::MissingInvoiceCode)
        ));
    }

    #[tokio::test]
    async fn cancelled_invoices_take_no_receipts() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = ReceiptService::new(db.pool.clone());
        let invoice = seed_invoice(&db, "FOLKS/INV/08/001").await;
        Invoice::update_header(
            &db.pool,
            &invoice.invoice_code,
            &UpdateInvoiceHeader {
                status: Some(InvoiceStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            service.create_for_invoice(invoice.id, &receipt(1_000)).await,
            Err(ReceiptError::InvoiceCancelled)
        ));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = ReceiptService::new(db.pool.clone());
        let invoice = seed_invoice(&db, "FOLKS/INV/08/001").await;
        let created = service
            .create_for_invoice(invoice.id, &receipt(20_000))
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                &UpdateReceipt {
                    amount: Some(25_000),
                    notes: Some("koreksi".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, 25_000);
        assert_eq!(updated.method.as_deref(), Some("Transfer"));
        assert_eq!(updated.notes.as_deref(), Some("koreksi"));

        assert!(matches!(
            service.update(created.id, &UpdateReceipt::default()).await,
            Err(ReceiptError::InvalidAmount)
        ));
        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.delete(created.id).await,
            Err(ReceiptError::NotFound)
        ));
        assert!(matches!(
            service
                .update(
                    created.id,
                    &UpdateReceipt {
                        amount: Some(1),
                        ..Default::default()
                    }
                )
                .await,
            Err(ReceiptError::NotFound)
        ));
    }
}
