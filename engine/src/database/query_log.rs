use super::types::{Database, SearchQueryRow};
use crate::error::Result;

impl Database {
    /// Records an executed search for analytics. Callers treat failures as
    /// non-fatal; losing a history row must never fail the search itself.
    pub async fn record_search_query(
        &self,
        query_string: &str,
        user_id: Option<&str>,
        execution_time_ms: i64,
        result_count: i64,
        cache_status: &str,
    ) -> Result<()> {
        let created_at_ns = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        sqlx::query(
            "INSERT INTO search_queries (query_string, user_id, execution_time_ms, result_count, cache_status, created_at_ns) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(query_string)
        .bind(user_id)
        .bind(execution_time_ms)
        .bind(result_count)
        .bind(cache_status)
        .bind(created_at_ns)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent searches, newest first.
    pub async fn query_history(&self, limit: i64) -> Result<Vec<SearchQueryRow>> {
        let rows = sqlx::query_as::<_, SearchQueryRow>(
            "SELECT id, query_string, user_id, execution_time_ms, result_count, cache_status, created_at_ns \
             FROM search_queries ORDER BY created_at_ns DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
