use chrono::Local;
use db::models::{
    handover::{CreateHandoverLetter, HandoverLetter, UpdateHandoverLetter},
    invoice::Invoice,
    staff::Staff,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum HandoverError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invoiceCode and staffNim are required")]
    MissingFields,
    #[error("Invoice not found")]
    InvoiceNotFound,
    #[error("Staff not found")]
    StaffNotFound,
    #[error("Handover letter not found")]
    NotFound,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct HandoverService {
    pool: SqlitePool,
}

impl HandoverService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn staff_by_nim(&self, nim: &str) -> Result<Staff, HandoverError> {
        Staff::find_by_nim(&self.pool, nim)
            .await?
            .ok_or(HandoverError::StaffNotFound)
    }

    pub async fn list_by_code(&self, code: &str) -> Result<Vec<HandoverLetter>, HandoverError> {
        let invoice = Invoice::find_by_code(&self.pool, code.trim())
            .await?
            .ok_or(HandoverError::InvoiceNotFound)?;
        Ok(HandoverLetter::find_by_invoice_id(&self.pool, invoice.id).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<HandoverLetter, HandoverError> {
        HandoverLetter::find_by_id(&self.pool, id)
            .await?
            .ok_or(HandoverError::NotFound)
    }

    /// Letter date defaults to today.
    pub async fn create(&self, data: &CreateHandoverLetter) -> Result<HandoverLetter, HandoverError> {
        let (Some(code), Some(nim)) = (
            non_blank(data.invoice_code.as_deref()),
            non_blank(data.staff_nim.as_deref()),
        ) else {
            return Err(HandoverError::MissingFields);
        };

        let invoice = Invoice::find_by_code(&self.pool, code)
            .await?
            .ok_or(HandoverError::InvoiceNotFound)?;
        let staff = self.staff_by_nim(nim).await?;
        let letter_date = data
            .letter_date
            .unwrap_or_else(|| Local::now().date_naive());

        let letter = HandoverLetter::create(
            &self.pool,
            Uuid::new_v4(),
            invoice.id,
            staff.id,
            letter_date,
            data.description.as_deref(),
        )
        .await?;
        info!(invoice_code = %invoice.invoice_code, staff_nim = %nim, "Created handover letter");
        Ok(letter)
    }

    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateHandoverLetter,
    ) -> Result<HandoverLetter, HandoverError> {
        let staff_id = match non_blank(data.staff_nim.as_deref()) {
            Some(nim) => Some(self.staff_by_nim(nim).await?.id),
            None => None,
        };

        let updated = HandoverLetter::update(
            &self.pool,
            id,
            data.letter_date,
            staff_id,
            data.description.as_deref(),
        )
        .await?;
        if !updated {
            return Err(HandoverError::NotFound);
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), HandoverError> {
        if HandoverLetter::delete(&self.pool, id).await? == 0 {
            return Err(HandoverError::NotFound);
        }
        Ok(())
    }
}
