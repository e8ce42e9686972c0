use super::types::{Database, LogRecord, Sort};
use crate::error::Result;
use crate::search::SqlValue;

const LOG_COLUMNS: &str = "id, timestamp, level, service, message, user_id, request_id";

impl Database {
    /// Total rows matching a translated predicate. The predicate fragment
    /// contains only `?` placeholders; every literal arrives via `params`.
    pub async fn count_logs(&self, predicate_sql: &str, params: &[SqlValue]) -> Result<i64> {
        let query = format!("SELECT COUNT(*) FROM logs WHERE {predicate_sql}");

        let mut query_builder = sqlx::query_scalar::<_, i64>(&query);
        for param in params {
            query_builder = match param {
                SqlValue::Text(v) => query_builder.bind(v.as_str()),
                SqlValue::Integer(v) => query_builder.bind(*v),
            };
        }

        let count = query_builder.fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Fetches one result page. Ordering is timestamp-first with an `id
    /// ASC` tie-break so identical timestamps cannot shuffle rows between
    /// pages; `page` is 1-based.
    pub async fn search_logs(
        &self,
        predicate_sql: &str,
        params: &[SqlValue],
        page: i64,
        page_size: i64,
        sort: Sort,
    ) -> Result<Vec<LogRecord>> {
        let order = match sort {
            Sort::NewestFirst => "timestamp DESC, id ASC",
            Sort::OldestFirst => "timestamp ASC, id ASC",
        };
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM logs WHERE {predicate_sql} ORDER BY {order} LIMIT ? OFFSET ?"
        );
        let offset = (page - 1) * page_size;

        let mut query_builder = sqlx::query_as::<_, LogRecord>(&query);
        for param in params {
            query_builder = match param {
                SqlValue::Text(v) => query_builder.bind(v.as_str()),
                SqlValue::Integer(v) => query_builder.bind(*v),
            };
        }

        let records = query_builder
            .bind(page_size)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }
}
