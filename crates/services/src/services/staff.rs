use db::models::staff::{CreateStaff, Staff, UpdateStaff};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StaffError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("name is required")]
    MissingName,
    #[error("NIM already exists")]
    DuplicateNim,
    #[error("Staff not found")]
    NotFound,
}

impl From<sqlx::Error> for StaffError {
    fn from(err: sqlx::Error) -> Self {
        let duplicate = err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);
        if duplicate {
            StaffError::DuplicateNim
        } else {
            StaffError::Database(err)
        }
    }
}

pub struct StaffService {
    pool: SqlitePool,
}

impl StaffService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn search(&self, q: Option<&str>) -> Result<Vec<Staff>, StaffError> {
        Ok(Staff::search(&self.pool, q).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Staff, StaffError> {
        Staff::find_by_id(&self.pool, id)
            .await?
            .ok_or(StaffError::NotFound)
    }

    pub async fn create(&self, data: &CreateStaff) -> Result<Staff, StaffError> {
        if data.name.trim().is_empty() {
            return Err(StaffError::MissingName);
        }
        let staff = Staff::create(&self.pool, data, Uuid::new_v4()).await?;
        info!(staff_id = %staff.id, nim = ?staff.nim, "Created staff member");
        Ok(staff)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateStaff) -> Result<Staff, StaffError> {
        if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(StaffError::MissingName);
        }
        Staff::update(&self.pool, id, data)
            .await?
            .ok_or(StaffError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StaffError> {
        if Staff::delete(&self.pool, id).await? == 0 {
            return Err(StaffError::NotFound);
        }
        Ok(())
    }
}
