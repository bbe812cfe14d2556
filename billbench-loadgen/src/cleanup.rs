use async_trait::async_trait;
use billbench_common::{BenchError, Result};
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DbConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of deleting a run's synthetic bills. Always reported, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    pub attempted: bool,
    pub deleted_count: usize,
    pub deleted_ids: Vec<i64>,
    pub error: Option<String>,
}

impl CleanupReport {
    pub fn skipped() -> Self {
        Self { attempted: false, deleted_count: 0, deleted_ids: Vec::new(), error: None }
    }

    pub fn deleted(ids: Vec<i64>) -> Self {
        Self { attempted: true, deleted_count: ids.len(), deleted_ids: ids, error: None }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            attempted: true,
            deleted_count: 0,
            deleted_ids: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Direct access to the bills table, bypassing the HTTP API under test.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Delete every bill created by the run with this prefix and return the
    /// deleted ids.
    async fn delete_bills_with_prefix(&self, prefix: &str) -> Result<Vec<i64>>;
}

/// Postgres-backed [`BillStore`]. Bill lines go with their bill through the
/// schema's `ON DELETE CASCADE`.
pub struct PgBillStore {
    pool: PgPool,
}

impl PgBillStore {
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| BenchError::Store(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl BillStore for PgBillStore {
    async fn delete_bills_with_prefix(&self, prefix: &str) -> Result<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            r"DELETE FROM bill WHERE bill_number LIKE $1 ESCAPE '\' RETURNING id",
        )
        .bind(like_prefix_pattern(prefix))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BenchError::Store(e.to_string()))
    }
}

/// LIKE pattern matching bill numbers generated for `prefix`
/// (`<prefix>-<index>`), with `%`, `_` and `\` in the prefix matched literally.
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 2);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push_str("-%");
    pattern
}

/// Best-effort removal of a run's bills. Store errors end up in
/// [`CleanupReport::error`].
pub async fn cleanup(store: &dyn BillStore, prefix: &str) -> CleanupReport {
    match store.delete_bills_with_prefix(prefix).await {
        Ok(ids) => {
            info!(prefix, deleted = ids.len(), "cleanup finished");
            CleanupReport::deleted(ids)
        }
        Err(e) => {
            warn!(prefix, error = %e, "cleanup failed");
            CleanupReport::failed(e)
        }
    }
}

/// Connect with `config` and clean up; a failed connection is reported the
/// same way as a failed delete.
pub async fn connect_and_cleanup(config: &DbConfig, prefix: &str) -> CleanupReport {
    match PgBillStore::connect(config).await {
        Ok(store) => cleanup(&store, prefix).await,
        Err(e) => {
            warn!(host = %config.host, port = config.port, error = %e, "cannot connect to bills database");
            CleanupReport::failed(e)
        }
    }
}
