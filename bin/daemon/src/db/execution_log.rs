//! Database repository for execution log records.
//!
//! The engine only writes logs: one insert when a run starts, then
//! updates as the path grows and when the run finalizes. Reads belong to
//! the reporting surface, which queries the table directly.

use crosswire_flow::ExecutionLog;
use sqlx::PgPool;

/// Repository for execution log operations.
pub struct ExecutionLogRepository {
    pool: PgPool,
}

impl ExecutionLogRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new log record.
    pub async fn insert(&self, log: &ExecutionLog) -> Result<(), sqlx::Error> {
        let execution_path = serde_json::to_value(&log.execution_path).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO execution_logs
                (id, flow_id, user_id, trigger_type, trigger_data, execution_path,
                 status, result, error, execution_time_ms, retry_count, max_retries,
                 started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(log.id.to_string())
        .bind(log.flow_id.to_string())
        .bind(log.user_id.to_string())
        .bind(&log.trigger_type)
        .bind(&log.trigger_data)
        .bind(&execution_path)
        .bind(log.status.as_str())
        .bind(&log.result)
        .bind(&log.error)
        .bind(log.execution_time_ms.map(millis_to_i64))
        .bind(count_to_i32(log.retry_count))
        .bind(count_to_i32(log.max_retries))
        .bind(log.started_at)
        .bind(log.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing log record with the current path and outcome.
    pub async fn update(&self, log: &ExecutionLog) -> Result<(), sqlx::Error> {
        let execution_path = serde_json::to_value(&log.execution_path).unwrap_or_default();

        sqlx::query(
            r#"
            UPDATE execution_logs
            SET execution_path = $2, status = $3, result = $4, error = $5,
                execution_time_ms = $6, retry_count = $7, finished_at = $8
            WHERE id = $1
            "#,
        )
        .bind(log.id.to_string())
        .bind(&execution_path)
        .bind(log.status.as_str())
        .bind(&log.result)
        .bind(&log.error)
        .bind(log.execution_time_ms.map(millis_to_i64))
        .bind(count_to_i32(log.retry_count))
        .bind(log.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Clamps an elapsed-time value into the BIGINT column range.
fn millis_to_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

/// Clamps a retry counter into the INTEGER column range.
fn count_to_i32(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
