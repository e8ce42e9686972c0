use thiserror::Error;

/// Errors surfaced by the search engine.
///
/// `Syntax`, `UnknownField` and `TypeMismatch` are query-correctable and
/// carry enough context (position, field name) for a UI to highlight the
/// offending part. `Timeout` is retryable by the caller with backoff;
/// `BackingStore` and `Cache` are operator problems and are logged with
/// full detail before being returned.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query string violates the grammar.
    #[error("syntax error at position {position}: expected {expected}, found {found}")]
    Syntax {
        position: usize,
        expected: String,
        found: String,
    },

    /// A field clause names a column outside the allow-list.
    #[error("unknown search field: {0}")]
    UnknownField(String),

    /// A value cannot be interpreted as the field's type.
    #[error("type mismatch for field {field}: {value:?} is not a valid {expected}")]
    TypeMismatch {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// The backing store exceeded the configured deadline.
    #[error("search timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Connectivity or query failure in the backing store.
    #[error("backing store error: {0}")]
    BackingStore(#[from] sqlx::Error),

    /// Cached payload could not be (de)serialized.
    #[error("cache payload error: {0}")]
    Cache(#[from] serde_json::Error),
}

impl SearchError {
    /// True for errors a caller may retry with backoff. Malformed queries
    /// and store failures are never retried here.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Timeout { .. })
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SearchError>;
