use super::types::{Database, FacetBucket, FacetResult};
use crate::config::SearchFields;
use crate::error::{Result, SearchError};
use crate::search::SqlValue;

impl Database {
    /// Per-distinct-value counts for one facet field over the filtered
    /// result set. Reuses the exact predicate and parameter list the main
    /// search ran with, so the counts always describe the rows the caller
    /// is looking at. Buckets are capped; `total_distinct` reports the
    /// uncapped cardinality so truncation is detectable.
    pub async fn facet_counts(
        &self,
        predicate_sql: &str,
        params: &[SqlValue],
        fields: &SearchFields,
        facet_field: &str,
        cap: i64,
    ) -> Result<FacetResult> {
        let column = &fields
            .get(facet_field)
            .ok_or_else(|| SearchError::UnknownField(facet_field.to_string()))?
            .column;

        // CAST keeps integer columns (timestamp) groupable as text values.
        let bucket_query = format!(
            "SELECT CAST({column} AS TEXT) AS value, COUNT(*) AS count FROM logs \
             WHERE {column} IS NOT NULL AND ({predicate_sql}) \
             GROUP BY {column} ORDER BY count DESC, value ASC LIMIT ?"
        );

        let mut query_builder = sqlx::query_as::<_, (String, i64)>(&bucket_query);
        for param in params {
            query_builder = match param {
                SqlValue::Text(v) => query_builder.bind(v.as_str()),
                SqlValue::Integer(v) => query_builder.bind(*v),
            };
        }
        let rows = query_builder.bind(cap).fetch_all(&self.pool).await?;

        let distinct_query =
            format!("SELECT COUNT(DISTINCT {column}) FROM logs WHERE {predicate_sql}");
        let mut distinct_builder = sqlx::query_scalar::<_, i64>(&distinct_query);
        for param in params {
            distinct_builder = match param {
                SqlValue::Text(v) => distinct_builder.bind(v.as_str()),
                SqlValue::Integer(v) => distinct_builder.bind(*v),
            };
        }
        let total_distinct = distinct_builder.fetch_one(&self.pool).await?;

        Ok(FacetResult {
            field: facet_field.to_string(),
            buckets: rows
                .into_iter()
                .map(|(value, count)| FacetBucket { value, count })
                .collect(),
            total_distinct,
        })
    }
}
