use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

/// How a searchable field's values are interpreted and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Stored as i64 nanoseconds since the Unix epoch; query values are
    /// RFC 3339 datetimes or bare `YYYY-MM-DD` dates.
    Timestamp,
}

#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub column: String,
    pub kind: FieldKind,
}

/// Allow-list of searchable fields, mapping query field names to columns.
///
/// This is configuration rather than translator internals so fields can be
/// added without touching parsing or translation logic. Iteration order is
/// stable (BTreeMap) to keep generated SQL deterministic.
#[derive(Debug, Clone)]
pub struct SearchFields {
    fields: BTreeMap<String, FieldConfig>,
    free_text_column: String,
}

impl SearchFields {
    pub fn new(free_text_column: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            free_text_column: free_text_column.into(),
        }
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldConfig {
                column: column.into(),
                kind,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.get(name)
    }

    /// Column that unscoped free-text terms match against.
    pub fn free_text_column(&self) -> &str {
        &self.free_text_column
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl Default for SearchFields {
    /// The standard log schema: `timestamp`, `level`, `service`, `message`,
    /// `user_id`, `request_id`, with free text going to `message`.
    fn default() -> Self {
        SearchFields::new("message")
            .with_field("timestamp", "timestamp", FieldKind::Timestamp)
            .with_field("level", "level", FieldKind::Text)
            .with_field("service", "service", FieldKind::Text)
            .with_field("message", "message", FieldKind::Text)
            .with_field("user_id", "user_id", FieldKind::Text)
            .with_field("request_id", "request_id", FieldKind::Text)
    }
}

/// Engine tuning knobs. All have sensible defaults; `from_env` overrides
/// them from `LOGSEARCH_*` environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard ceiling on `page_size`; larger requests are clamped, not
    /// rejected, and the response reports the effective value.
    pub max_page_size: i64,
    pub default_page_size: i64,
    /// Maximum distinct buckets returned per facet field.
    pub facet_cap: i64,
    pub cache_ttl: Duration,
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_page_size: 500,
            default_page_size: 50,
            facet_cap: 50,
            cache_ttl: Duration::from_secs(60),
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_page_size: env_i64("LOGSEARCH_MAX_PAGE_SIZE", defaults.max_page_size),
            default_page_size: env_i64("LOGSEARCH_DEFAULT_PAGE_SIZE", defaults.default_page_size),
            facet_cap: env_i64("LOGSEARCH_FACET_CAP", defaults.facet_cap),
            cache_ttl: Duration::from_secs(env_i64(
                "LOGSEARCH_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs() as i64,
            ) as u64),
            query_timeout: Duration::from_secs(env_i64(
                "LOGSEARCH_QUERY_TIMEOUT_SECS",
                defaults.query_timeout.as_secs() as i64,
            ) as u64),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
