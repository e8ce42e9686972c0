use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

/// One stored log row. `timestamp` is nanoseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogRecord {
    pub id: i64,
    pub timestamp: i64,
    pub level: String,
    pub service: String,
    pub message: String,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
}

/// Input for log ingestion; the database assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLogRecord {
    pub timestamp: i64,
    pub level: String,
    pub service: String,
    pub message: String,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
}

/// Result ordering. The tie-break on `id ASC` is always applied so
/// pagination stays stable when many rows share a timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// One page of search results. Field names are wire contract; dashboards
/// bind to them directly. `page_size` reports the effective (possibly
/// clamped) value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<LogRecord>,
    pub total_matched: i64,
    pub page: i64,
    pub page_size: i64,
    pub took_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub value: String,
    pub count: i64,
}

/// Count-per-distinct-value breakdown for one field. `total_distinct` is
/// the true cardinality even when `buckets` was truncated by the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub field: String,
    pub buckets: Vec<FacetBucket>,
    pub total_distinct: i64,
}

/// A recorded historical search.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchQueryRow {
    pub id: i64,
    pub query_string: String,
    pub user_id: Option<String>,
    pub execution_time_ms: i64,
    pub result_count: i64,
    pub cache_status: String,
    pub created_at_ns: i64,
}
