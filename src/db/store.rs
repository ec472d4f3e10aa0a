use sqlx::PgPool;
use tracing::info;

use crate::error::{PersistError, Result};
use crate::types::TradingRecord;

/// Storage boundary the pipeline talks to. One `save_batch` call is atomic:
/// either every record of a report lands or none do.
pub trait TradingStore {
    async fn create_schema(&self) -> Result<()>;
    async fn save_batch(&self, records: &[TradingRecord])
        -> std::result::Result<u64, PersistError>;
}

/// PostgreSQL-backed store. Holds a connection pool injected at construction;
/// every batch runs in its own transaction.
#[derive(Debug, Clone)]
pub struct PgTradingStore {
    pool: PgPool,
}

impl PgTradingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_RECORD: &str = "\
    INSERT INTO spimex_trading_results (
        exchange_product_id, exchange_product_name, oil_id,
        delivery_basis_id, delivery_basis_name, delivery_type_id,
        volume, total, count, date
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

impl TradingStore for PgTradingStore {
    async fn create_schema(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database schema ready");
        Ok(())
    }

    async fn save_batch(
        &self,
        records: &[TradingRecord],
    ) -> std::result::Result<u64, PersistError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(INSERT_RECORD)
                .bind(&record.exchange_product_id)
                .bind(&record.exchange_product_name)
                .bind(&record.oil_id)
                .bind(&record.delivery_basis_id)
                .bind(&record.delivery_basis_name)
                .bind(&record.delivery_type_id)
                .bind(record.volume)
                .bind(record.total)
                .bind(record.count)
                .bind(record.date)
                .execute(&mut *tx)
                .await
                .map_err(classify)?;
        }
        tx.commit().await?;

        Ok(records.len() as u64)
    }
}

/// A unique violation means the report was already loaded by an earlier run;
/// callers log that as a skip rather than a storage fault.
fn classify(e: sqlx::Error) -> PersistError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            return PersistError::Duplicate;
        }
    }
    PersistError::Storage(e)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
