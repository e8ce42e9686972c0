use crate::cache::ResultCache;
use crate::config::{EngineConfig, SearchFields};
use crate::database::{Database, FacetResult, LogRecord, SearchPage, Sort};
use crate::error::{Result, SearchError};
use crate::search::{parse, SqlValue, Translator};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;

/// One search invocation. `page` is 1-based; `page_size` of `None` takes
/// the configured default. `facets` names the fields to compute facet
/// counts for alongside the result page.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub page: i64,
    pub page_size: Option<i64>,
    pub sort: Sort,
    pub facets: Vec<String>,
    pub user_id: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            page_size: None,
            sort: Sort::default(),
            facets: Vec::new(),
            user_id: None,
        }
    }
}

/// Wire-facing response: the result page plus facet counts computed over
/// the same filtered set within the same request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub page: SearchPage,
    pub facets: Vec<FacetResult>,
}

/// Request-scoped, stateless search engine. Parsing and translation are
/// pure and run concurrently across requests without shared state; the
/// only shared mutable state is the optional injected result cache.
pub struct SearchEngine {
    db: Database,
    fields: SearchFields,
    config: EngineConfig,
    cache: Option<ResultCache>,
}

impl SearchEngine {
    /// `cache: None` disables result caching entirely (the test
    /// substitute); per-tenant engines get their own cache handles rather
    /// than sharing a global.
    pub fn new(
        db: Database,
        fields: SearchFields,
        config: EngineConfig,
        cache: Option<ResultCache>,
    ) -> Self {
        Self {
            db,
            fields,
            config,
            cache,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn fields(&self) -> &SearchFields {
        &self.fields
    }

    /// Runs one search: parse, translate, execute with pagination, compute
    /// facets, all against the same predicate. Syntax and semantic errors
    /// fail fast and are never cached or retried.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();

        let ast = parse(&request.query)?;
        let (predicate, params) = Translator::new(&self.fields).translate(&ast)?;
        let canonical = ast.to_string();

        let page = request.page.max(1);
        let requested = request
            .page_size
            .unwrap_or(self.config.default_page_size)
            .max(1);
        let page_size = requested.min(self.config.max_page_size);
        if page_size < requested {
            tracing::warn!(
                "page_size {} clamped to {} for query {:?}",
                requested,
                page_size,
                request.query
            );
        }

        let cache_key = cache_key(&canonical, page, page_size, request.sort, &request.facets);
        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.get(&cache_key) {
                let response: SearchResponse = serde_json::from_slice(&payload)?;
                self.record_history(request, started, response.page.total_matched, "HIT")
                    .await;
                tracing::info!(
                    "search cache hit for {:?} ({} rows, {}ms)",
                    canonical,
                    response.page.total_matched,
                    started.elapsed().as_millis()
                );
                return Ok(response);
            }
        }

        let predicate_sql = predicate.to_sql();
        let executed = tokio::time::timeout(
            self.config.query_timeout,
            self.execute(&predicate_sql, &params, page, page_size, request),
        )
        .await;

        let (total_matched, items, facets) = match executed {
            Ok(Ok(results)) => results,
            Ok(Err(err)) => {
                tracing::error!(
                    "search failed: {err}; predicate: {predicate_sql}; params: {params:?}"
                );
                return Err(err);
            }
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::error!(
                    "search timed out after {elapsed_ms}ms; predicate: {predicate_sql}; params: {params:?}"
                );
                return Err(SearchError::Timeout { elapsed_ms });
            }
        };

        let took_ms = started.elapsed().as_millis() as u64;
        let response = SearchResponse {
            page: SearchPage {
                items,
                total_matched,
                page,
                page_size,
                took_ms,
            },
            facets,
        };

        if let Some(cache) = &self.cache {
            match serde_json::to_vec(&response) {
                Ok(payload) => cache.put(cache_key, payload),
                Err(err) => tracing::warn!("failed to serialize response for cache: {err}"),
            }
        }

        self.record_history(request, started, total_matched, "MISS")
            .await;
        tracing::info!(
            "search {:?} matched {} rows in {}ms",
            canonical,
            total_matched,
            took_ms
        );

        Ok(response)
    }

    /// Count, page and facet queries for one request. Sequential is
    /// sufficient: the facet queries depend only on the predicate, not on
    /// the page contents.
    async fn execute(
        &self,
        predicate_sql: &str,
        params: &[SqlValue],
        page: i64,
        page_size: i64,
        request: &SearchRequest,
    ) -> Result<(i64, Vec<LogRecord>, Vec<FacetResult>)> {
        let total_matched = self.db.count_logs(predicate_sql, params).await?;
        let items = self
            .db
            .search_logs(predicate_sql, params, page, page_size, request.sort)
            .await?;

        let mut facets = Vec::with_capacity(request.facets.len());
        for field in &request.facets {
            let facet = self
                .db
                .facet_counts(predicate_sql, params, &self.fields, field, self.config.facet_cap)
                .await?;
            facets.push(facet);
        }

        Ok((total_matched, items, facets))
    }

    /// Best-effort analytics row; losing one must never fail the search.
    async fn record_history(
        &self,
        request: &SearchRequest,
        started: Instant,
        result_count: i64,
        cache_status: &str,
    ) {
        let elapsed_ms = started.elapsed().as_millis() as i64;
        if let Err(err) = self
            .db
            .record_search_query(
                &request.query,
                request.user_id.as_deref(),
                elapsed_ms,
                result_count,
                cache_status,
            )
            .await
        {
            tracing::warn!("failed to record search history: {err}");
        }
    }
}

/// Cache key over everything that shapes the payload. Uses the canonical
/// AST rendering so syntactic variants (`a b` vs `a AND b`) share entries;
/// facet fields participate because facets ride in the cached payload.
fn cache_key(canonical: &str, page: i64, page_size: i64, sort: Sort, facets: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update([0]);
    hasher.update(page.to_le_bytes());
    hasher.update(page_size.to_le_bytes());
    hasher.update([sort as u8]);
    for facet in facets {
        hasher.update(facet.as_bytes());
        hasher.update([0]);
    }
    format!("search:{:x}", hasher.finalize())
}
