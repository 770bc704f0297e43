//! Startup check that the schema the services rely on is actually present.

use db::REQUIRED_TABLES;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

/// Unique indexes the invoice code, staff NIM and login rules depend on.
pub const REQUIRED_UNIQUE_INDEXES: &[&str] = &[
    "idx_invoices_code",
    "idx_staff_nim",
    "idx_users_email",
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database schema incomplete: {0}")]
    SchemaIncomplete(String),
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub migrations_applied: i64,
    pub latest_migration: Option<String>,
    pub missing_tables: Vec<String>,
    pub missing_indexes: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.migrations_applied > 0
            && self.missing_tables.is_empty()
            && self.missing_indexes.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.migrations_applied == 0 {
            return "no migrations applied".to_string();
        }
        let mut missing: Vec<String> = self
            .missing_tables
            .iter()
            .map(|t| format!("table {t}"))
            .collect();
        missing.extend(self.missing_indexes.iter().map(|i| format!("index {i}")));
        if missing.is_empty() {
            format!("{} migrations applied", self.migrations_applied)
        } else {
            format!("missing {}", missing.join(", "))
        }
    }
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn object_exists(&self, kind: &str, name: &str) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = $1 AND name = $2",
        )
        .bind(kind)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn missing(&self, kind: &str, names: &[&str]) -> Result<Vec<String>, sqlx::Error> {
        let mut missing = Vec::new();
        for name in names {
            if !self.object_exists(kind, name).await? {
                missing.push(name.to_string());
            }
        }
        Ok(missing)
    }

    pub async fn report(&self) -> Result<ValidationReport, DatabaseValidationError> {
        if !self.object_exists("table", "_sqlx_migrations").await? {
            warn!("Migrations table is missing");
            return Ok(ValidationReport {
                missing_tables: REQUIRED_TABLES.iter().map(|t| t.to_string()).collect(),
                missing_indexes: REQUIRED_UNIQUE_INDEXES
                    .iter()
                    .map(|i| i.to_string())
                    .collect(),
                ..Default::default()
            });
        }

        let migrations_applied =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        let latest_migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(ValidationReport {
            migrations_applied,
            latest_migration,
            missing_tables: self.missing("table", REQUIRED_TABLES).await?,
            missing_indexes: self.missing("index", REQUIRED_UNIQUE_INDEXES).await?,
        })
    }

    /// Fails when a table or unique index is missing.
    pub async fn validate(&self) -> Result<ValidationReport, DatabaseValidationError> {
        let report = self.report().await?;
        if !report.is_ok() {
            return Err(DatabaseValidationError::SchemaIncomplete(report.summary()));
        }
        info!(
            migrations_applied = report.migrations_applied,
            latest = ?report.latest_migration,
            "Database schema validated"
        );
        Ok(report)
    }
}
