//! Invoice lifecycle: code allocation, line items, detail aggregation and the
//! rules that used to live in the database procedures.

use chrono::NaiveDate;
use db::models::{
    handover::HandoverLetter,
    invoice::{
        CreateInvoice, CreatedInvoice, Invoice, InvoiceSearch, InvoiceStatus, InvoiceSummary,
        NewInvoice, UpdateInvoiceHeader,
    },
    invoice_item::{CreateInvoiceItem, InvoiceItem, NewInvoiceItem},
    product::Product,
    receipt::Receipt,
};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::invoice_code::{self, InvoiceTypeError};

/// Attempts at allocating a code before giving up on concurrent writers.
pub const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invoiceType and invoiceDate are required")]
    MissingHeader,
    #[error(transparent)]
    InvalidType(#[from] InvoiceTypeError),
    #[error("Invoice not found")]
    NotFound,
    #[error("Invoice item not found")]
    ItemNotFound,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Item description is required")]
    MissingDescription,
    #[error("Quantity must be > 0")]
    InvalidQuantity,
    #[error("Unit price is required")]
    MissingUnitPrice,
    #[error("Unit price must be >= 0")]
    NegativeUnitPrice,
    #[error("Down payment must be >= 0")]
    NegativeDownPayment,
    #[error("Cannot set status to Paid while there is remaining balance")]
    RemainingBalance { balance: i64 },
    #[error("Referenced client or staff does not exist")]
    InvalidReference,
    #[error("could not allocate a unique invoice code after {0} attempts")]
    CodeExhausted(u32),
}

/// Summary plus everything attached to the invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub summary: InvoiceSummary,
    pub items: Vec<InvoiceItem>,
    pub receipts: Vec<Receipt>,
    pub handovers: Vec<HandoverLetter>,
}

/// Validated header of an invoice about to be inserted.
#[derive(Debug, Clone)]
struct HeaderDraft {
    invoice_type: String,
    invoice_date: NaiveDate,
    client_id: Option<Uuid>,
    staff_id: Option<Uuid>,
    down_payment_amount: i64,
    status: InvoiceStatus,
    notes: Option<String>,
}

impl HeaderDraft {
    fn from_request(data: &CreateInvoice) -> Result<Self, InvoiceError> {
        let raw_type = data
            .invoice_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(InvoiceError::MissingHeader)?;
        let invoice_date = data.invoice_date.ok_or(InvoiceError::MissingHeader)?;
        let down_payment_amount = data.down_payment_amount.unwrap_or(0);
        if down_payment_amount < 0 {
            return Err(InvoiceError::NegativeDownPayment);
        }

        Ok(Self {
            invoice_type: invoice_code::normalize_type(raw_type)?,
            invoice_date,
            client_id: data.client_id,
            staff_id: data.staff_id,
            down_payment_amount,
            status: data.status.unwrap_or_default(),
            notes: data.notes.clone(),
        })
    }

    fn with_code(&self, invoice_code: String) -> NewInvoice {
        NewInvoice {
            invoice_code,
            invoice_type: self.invoice_type.clone(),
            invoice_date: self.invoice_date,
            client_id: self.client_id,
            staff_id: self.staff_id,
            down_payment_amount: self.down_payment_amount,
            status: self.status,
            notes: self.notes.clone(),
        }
    }
}

/// Apply product defaults to a requested line item and validate it.
pub fn build_item(
    item: &CreateInvoiceItem,
    product: Option<&Product>,
) -> Result<NewInvoiceItem, InvoiceError> {
    let description = item
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| product.map(|p| p.name.clone()))
        .ok_or(InvoiceError::MissingDescription)?;

    let quantity = item.quantity.unwrap_or(0);
    if quantity <= 0 {
        return Err(InvoiceError::InvalidQuantity);
    }

    let unit_price = item
        .unit_price
        .or_else(|| product.map(|p| p.unit_price))
        .ok_or(InvoiceError::MissingUnitPrice)?;
    if unit_price < 0 {
        return Err(InvoiceError::NegativeUnitPrice);
    }

    Ok(NewInvoiceItem {
        product_id: item.product_id,
        description,
        quantity,
        unit_price,
        purchase_location: item.purchase_location.clone(),
    })
}

async fn resolve_item(
    conn: &mut SqliteConnection,
    item: &CreateInvoiceItem,
) -> Result<NewInvoiceItem, InvoiceError> {
    let product = match item.product_id {
        Some(id) => Some(
            Product::find_by_id(&mut *conn, id)
                .await?
                .ok_or(InvoiceError::ProductNotFound)?,
        ),
        None => None,
    };
    build_item(item, product.as_ref())
}

/// Foreign-key failures mean the request pointed at a client or staff member that is gone.
fn classify(err: sqlx::Error) -> InvoiceError {
    let is_fk = err
        .as_database_error()
        .map(|e| e.is_foreign_key_violation())
        .unwrap_or(false);
    if is_fk {
        InvoiceError::InvalidReference
    } else {
        InvoiceError::Database(err)
    }
}

/// SQLite BUSY/LOCKED result codes, including BUSY_RECOVERY, LOCKED_SHAREDCACHE and BUSY_SNAPSHOT.
const LOCK_CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Another writer took the code first or held the database lock.
fn is_retryable(err: &InvoiceError) -> bool {
    let InvoiceError::Database(e) = err else {
        return false;
    };
    e.as_database_error().is_some_and(|db| {
        db.is_unique_violation()
            || db
                .code()
                .is_some_and(|code| LOCK_CONTENTION_CODES.contains(&code.as_ref()))
    })
}

/// Write transactions take the database lock at BEGIN, before anything is read.
async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

pub struct InvoiceService {
    pool: SqlitePool,
}

impl InvoiceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an invoice with its items, allocating the next code for its type and month.
    pub async fn create(&self, data: &CreateInvoice) -> Result<CreatedInvoice, InvoiceError> {
        let header = HeaderDraft::from_request(data)?;
        let items = data.items.as_deref().unwrap_or_default();

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            match self.try_create(&header, items).await {
                Ok(created) => {
                    info!(
                        invoice_code = %created.invoice_code,
                        items = items.len(),
                        "Created invoice"
                    );
                    return Ok(created);
                }
                Err(e) if is_retryable(&e) => {
                    warn!(attempt, error = %e, "Invoice code allocation lost to a concurrent writer, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(InvoiceError::CodeExhausted(MAX_CODE_ATTEMPTS))
    }

    pub async fn create_empty(&self, data: &CreateInvoice) -> Result<CreatedInvoice, InvoiceError> {
        let data = CreateInvoice {
            items: None,
            ..data.clone()
        };
        self.create(&data).await
    }

    async fn try_create(
        &self,
        header: &HeaderDraft,
        items: &[CreateInvoiceItem],
    ) -> Result<CreatedInvoice, InvoiceError> {
        let mut tx = begin_write(&self.pool).await?;

        let prefix = invoice_code::code_prefix(&header.invoice_type, header.invoice_date);
        let existing = Invoice::codes_with_prefix(&mut *tx, &prefix).await?;
        let code = invoice_code::format_code(
            &prefix,
            invoice_code::next_sequence(&prefix, &existing),
        );

        let invoice = Invoice::create(&mut *tx, Uuid::new_v4(), &header.with_code(code))
            .await
            .map_err(classify)?;

        for item in items {
            let resolved = resolve_item(&mut tx, item).await?;
            InvoiceItem::create(&mut *tx, Uuid::new_v4(), invoice.id, &resolved).await?;
        }

        tx.commit().await?;

        Ok(CreatedInvoice {
            invoice_id: invoice.id,
            invoice_code: invoice.invoice_code,
        })
    }

    pub async fn search(&self, filter: &InvoiceSearch) -> Result<Vec<InvoiceSummary>, InvoiceError> {
        Ok(InvoiceSummary::search(&self.pool, filter).await?)
    }

    pub async fn detail(&self, code: &str) -> Result<InvoiceDetail, InvoiceError> {
        let summary = InvoiceSummary::find_by_code(&self.pool, code)
            .await?
            .ok_or(InvoiceError::NotFound)?;
        let items = InvoiceItem::find_by_invoice_id(&self.pool, summary.id).await?;
        let receipts = Receipt::find_by_invoice_id(&self.pool, summary.id).await?;
        let handovers = HandoverLetter::find_by_invoice_id(&self.pool, summary.id).await?;

        Ok(InvoiceDetail {
            summary,
            items,
            receipts,
            handovers,
        })
    }

    /// Partial header update. A Paid invoice must stay settled after the change.
    pub async fn update_header(
        &self,
        code: &str,
        changes: &UpdateInvoiceHeader,
    ) -> Result<InvoiceDetail, InvoiceError> {
        if changes.down_payment_amount.is_some_and(|dp| dp < 0) {
            return Err(InvoiceError::NegativeDownPayment);
        }

        let mut tx = begin_write(&self.pool).await?;
        let updated = Invoice::update_header(&mut *tx, code, changes)
            .await
            .map_err(classify)?
            .ok_or(InvoiceError::NotFound)?;

        // Applies to any edit of a Paid invoice, not only the one that marks it Paid.
        if updated.status == InvoiceStatus::Paid {
            let summary = InvoiceSummary::find_by_code(&mut *tx, code)
                .await?
                .ok_or(InvoiceError::NotFound)?;
            if summary.balance > 0 {
                // Dropping the transaction rolls the header change back.
                return Err(InvoiceError::RemainingBalance {
                    balance: summary.balance,
                });
            }
        }
        tx.commit().await?;

        info!(invoice_code = %code, "Updated invoice header");
        self.detail(code).await
    }

    pub async fn delete(&self, code: &str) -> Result<Invoice, InvoiceError> {
        let invoice = Invoice::delete_by_code(&self.pool, code)
            .await?
            .ok_or(InvoiceError::NotFound)?;
        info!(invoice_code = %code, "Deleted invoice");
        Ok(invoice)
    }

    pub async fn add_item(
        &self,
        invoice_id: Uuid,
        item: &CreateInvoiceItem,
    ) -> Result<InvoiceItem, InvoiceError> {
        let mut tx = begin_write(&self.pool).await?;
        Invoice::find_by_id(&mut *tx, invoice_id)
            .await?
            .ok_or(InvoiceError::NotFound)?;
        let resolved = resolve_item(&mut tx, item).await?;
        let created = InvoiceItem::create(&mut *tx, Uuid::new_v4(), invoice_id, &resolved).await?;
        tx.commit().await?;
        Ok(created)
    }

    pub async fn items_by_code(&self, code: &str) -> Result<Vec<InvoiceItem>, InvoiceError> {
        let invoice = Invoice::find_by_code(&self.pool, code)
            .await?
            .ok_or(InvoiceError::NotFound)?;
        Ok(InvoiceItem::find_by_invoice_id(&self.pool, invoice.id).await?)
    }

    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), InvoiceError> {
        if InvoiceItem::delete(&self.pool, item_id).await? == 0 {
            return Err(InvoiceError::ItemNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{
            client::{Client, CreateClient},
            product::ProductPayload,
            receipt::CreateReceipt,
        },
    };

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(invoice_type: &str, invoice_date: NaiveDate) -> CreateInvoice {
        CreateInvoice {
            invoice_type: Some(invoice_type.to_string()),
            invoice_date: Some(invoice_date),
            ..Default::default()
        }
    }

    fn item(description: &str, quantity: i64, unit_price: i64) -> CreateInvoiceItem {
        CreateInvoiceItem {
            description: Some(description.to_string()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            ..Default::default()
        }
    }

    #[test]
    fn build_item_fills_from_product() {
        let product = Product {
            id: Uuid::new_v4(),
            name: "Sewa Kostum".to_string(),
            description: None,
            unit_price: 150_000,
            category: None,
            product_type: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let requested = CreateInvoiceItem {
            quantity: Some(2),
            product_id: Some(product.id),
            ..Default::default()
        };
        let built = build_item(&requested, Some(&product)).unwrap();
        assert_eq!(built.description, "Sewa Kostum");
        assert_eq!(built.unit_price, 150_000);
        assert_eq!(built.line_total(), 300_000);
    }

    #[test]
    fn build_item_rejects_bad_quantities_and_prices() {
        assert!(matches!(
            build_item(&item("Rias", 0, 10), None),
            Err(InvoiceError::InvalidQuantity)
        ));
        assert!(matches!(
            build_item(&item("Rias", 1, -5), None),
            Err(InvoiceError::NegativeUnitPrice)
        ));
        assert!(matches!(
            build_item(&item("  ", 1, 5), None),
            Err(InvoiceError::MissingDescription)
        ));
        let no_price = CreateInvoiceItem {
            description: Some("Rias".to_string()),
            quantity: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            build_item(&no_price, None),
            Err(InvoiceError::MissingUnitPrice)
        ));
    }

    #[tokio::test]
    async fn codes_are_sequential_per_type_and_month() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());

        let first = service.create(&request("inv", date(2025, 8, 1))).await.unwrap();
        let second = service.create(&request("INV", date(2025, 8, 20))).await.unwrap();
        let other_type = service.create(&request("DP", date(2025, 8, 2))).await.unwrap();
        let other_month = service.create(&request("INV", date(2025, 9, 2))).await.unwrap();

        assert_eq!(first.invoice_code, "FOLKS/INV/08/001");
        assert_eq!(second.invoice_code, "FOLKS/INV/08/002");
        assert_eq!(other_type.invoice_code, "FOLKS/DP/08/001");
        assert_eq!(other_month.invoice_code, "FOLKS/INV/09/001");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_sequential_codes() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("invoices.db").display());
        let db = DBService::new(&url).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let service = InvoiceService::new(db.pool.clone());
                tokio::spawn(async move { service.create(&request("INV", date(2025, 8, 1))).await })
            })
            .collect();

        let mut codes = Vec::new();
        for task in tasks {
            codes.push(task.await.unwrap().unwrap().invoice_code);
        }
        codes.sort();
        let expected: Vec<_> = (1..=16).map(|n| format!("FOLKS/INV/08/{n:03}")).collect();
        assert_eq!(codes, expected);
    }

    #[tokio::test]
    async fn deleted_codes_are_not_reused_below_the_maximum() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());
        for _ in 0..3 {
            service.create(&request("INV", date(2025, 8, 1))).await.unwrap();
        }
        service.delete("FOLKS/INV/08/002").await.unwrap();

        let next = service.create(&request("INV", date(2025, 8, 1))).await.unwrap();
        assert_eq!(next.invoice_code, "FOLKS/INV/08/004");
    }

    #[tokio::test]
    async fn create_requires_type_and_date() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());

        let missing_date = CreateInvoice {
            invoice_type: Some("INV".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.create(&missing_date).await,
            Err(InvoiceError::MissingHeader)
        ));
        assert!(matches!(
            service.create(&request("IN V", date(2025, 8, 1))).await,
            Err(InvoiceError::InvalidType(InvoiceTypeError::Invalid))
        ));
    }

    #[tokio::test]
    async fn invalid_item_rolls_back_the_whole_invoice() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());

        let mut data = request("INV", date(2025, 8, 1));
        data.items = Some(vec![item("Kostum", 1, 100), item("Rias", 0, 100)]);
        assert!(matches!(
            service.create(&data).await,
            Err(InvoiceError::InvalidQuantity)
        ));

        let all = service.search(&InvoiceSearch::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn unknown_client_is_an_invalid_reference() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());

        let mut data = request("INV", date(2025, 8, 1));
        data.client_id = Some(Uuid::new_v4());
        assert!(matches!(
            service.create(&data).await,
            Err(InvoiceError::InvalidReference)
        ));
    }

    #[tokio::test]
    async fn detail_aggregates_totals_and_children() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());
        let client = Client::create(
            &db.pool,
            &CreateClient {
                name: "Sanggar Tari".to_string(),
                contact: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let mut data = request("INV", date(2025, 8, 1));
        data.client_id = Some(client.id);
        data.down_payment_amount = Some(100_000);
        data.items = Some(vec![item("Kostum", 2, 150_000), item("Rias", 1, 200_000)]);
        let created = service.create(&data).await.unwrap();

        Receipt::create(
            &db.pool,
            Uuid::new_v4(),
            created.invoice_id,
            date(2025, 8, 5),
            250_000,
            &CreateReceipt::default(),
        )
        .await
        .unwrap();

        let detail = service.detail(&created.invoice_code).await.unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.receipts.len(), 1);
        assert!(detail.handovers.is_empty());
        assert_eq!(detail.summary.client_name.as_deref(), Some("Sanggar Tari"));
        assert_eq!(detail.summary.subtotal, 500_000);
        assert_eq!(detail.summary.total_due, 400_000);
        assert_eq!(detail.summary.receipts_total, 250_000);
        assert_eq!(detail.summary.balance, 150_000);
    }

    #[tokio::test]
    async fn cannot_mark_paid_with_remaining_balance() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());
        let mut data = request("INV", date(2025, 8, 1));
        data.items = Some(vec![item("Kostum", 1, 100_000)]);
        let created = service.create(&data).await.unwrap();

        let paid = UpdateInvoiceHeader {
            status: Some(InvoiceStatus::Paid),
            ..Default::default()
        };
        let err = service
            .update_header(&created.invoice_code, &paid)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvoiceError::RemainingBalance { balance: 100_000 }
        ));

        // The rejected change must not stick.
        let detail = service.detail(&created.invoice_code).await.unwrap();
        assert_eq!(detail.summary.status, InvoiceStatus::Draft);

        Receipt::create(
            &db.pool,
            Uuid::new_v4(),
            created.invoice_id,
            date(2025, 8, 2),
            100_000,
            &CreateReceipt::default(),
        )
        .await
        .unwrap();
        let detail = service
            .update_header(&created.invoice_code, &paid)
            .await
            .unwrap();
        assert_eq!(detail.summary.status, InvoiceStatus::Paid);
        assert_eq!(detail.summary.balance, 0);
    }

    #[tokio::test]
    async fn paid_invoice_cannot_be_reopened_by_lowering_down_payment() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());
        let mut data = request("INV", date(2025, 8, 1));
        data.down_payment_amount = Some(100_000);
        data.items = Some(vec![item("Kostum", 1, 100_000)]);
        let created = service.create(&data).await.unwrap();

        let paid = service
            .update_header(
                &created.invoice_code,
                &UpdateInvoiceHeader {
                    status: Some(InvoiceStatus::Paid),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.summary.balance, 0);

        let err = service
            .update_header(
                &created.invoice_code,
                &UpdateInvoiceHeader {
                    down_payment_amount: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvoiceError::RemainingBalance { balance: 100_000 }
        ));

        let detail = service.detail(&created.invoice_code).await.unwrap();
        assert_eq!(detail.summary.status, InvoiceStatus::Paid);
        assert_eq!(detail.summary.down_payment_amount, 100_000);
        assert_eq!(detail.summary.balance, 0);

        // Notes on a settled invoice still go through.
        let noted = service
            .update_header(
                &created.invoice_code,
                &UpdateInvoiceHeader {
                    notes: Some("lunas".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(noted.summary.notes.as_deref(), Some("lunas"));
    }

    #[tokio::test]
    async fn add_item_uses_product_defaults() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = InvoiceService::new(db.pool.clone());
        let product_id = Uuid::new_v4();
        Product::create(
            &db.pool,
            product_id,
            "Sewa Sound",
            500_000,
            &ProductPayload::default(),
        )
        .await
        .unwrap();
        let created = service
            .create_empty(&request("INV", date(2025, 8, 1)))
            .await
            .unwrap();

        let added = service
            .add_item(
                created.invoice_id,
                &CreateInvoiceItem {
                    quantity: Some(2),
                    product_id: Some(product_id),
                    purchase_location: Some("Gudang".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(added.description, "Sewa Sound");
        assert_eq!(added.line_total, 1_000_000);

        let items = service.items_by_code(&created.invoice_code).await.unwrap();
        assert_eq!(items.len(), 1);

        service.delete_item(added.id).await.unwrap();
        assert!(matches!(
            service.delete_item(added.id).await,
            Err(InvoiceError::ItemNotFound)
        ));

        assert!(matches!(
            service
                .add_item(Uuid::new_v4(), &item("Rias", 1, 1))
                .await,
            Err(InvoiceError::NotFound)
        ));
    }
}
