use super::types::{Database, NewLogRecord};
use crate::error::Result;

const INSERT_LOG: &str = "INSERT INTO logs (timestamp, level, service, message, user_id, request_id) VALUES (?, ?, ?, ?, ?, ?)";

impl Database {
    /// Inserts a single log row, returning its id.
    pub async fn insert_log(&self, record: &NewLogRecord) -> Result<i64> {
        let result = sqlx::query(INSERT_LOG)
            .bind(record.timestamp)
            .bind(&record.level)
            .bind(&record.service)
            .bind(&record.message)
            .bind(record.user_id.as_deref())
            .bind(record.request_id.as_deref())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Inserts a batch of log rows in one transaction.
    pub async fn insert_logs(&self, records: &[NewLogRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(INSERT_LOG)
                .bind(record.timestamp)
                .bind(&record.level)
                .bind(&record.service)
                .bind(&record.message)
                .bind(record.user_id.as_deref())
                .bind(record.request_id.as_deref())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }
}
