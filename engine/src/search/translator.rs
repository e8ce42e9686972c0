use super::ast::Query;
use crate::config::{FieldKind, SearchFields};
use crate::error::{Result, SearchError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// A literal bound into the backing query. Values only ever travel through
/// this list; the rendered SQL never embeds them.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// Backing-store predicate tree, mirroring the AST shape. Each leaf refers
/// to its literal by index into the parameter list built alongside it; no
/// user text ever appears in the SQL rendering of this tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    MatchAll,
    Compare {
        column: String,
        op: CompareOp,
        param: usize,
    },
    Like {
        column: String,
        param: usize,
    },
    Between {
        column: String,
        low: Option<(CompareOp, usize)>,
        high: Option<(CompareOp, usize)>,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Renders the predicate as a SQL fragment with one `?` placeholder per
    /// parameter. The tree is walked in parameter-list order, so positional
    /// binding lines up with the indices stored in the nodes. Boolean nodes
    /// are always parenthesized so association and NOT scope survive.
    pub fn to_sql(&self) -> String {
        match self {
            Predicate::MatchAll => "1 = 1".to_string(),
            Predicate::Compare { column, op, .. } => format!("{column} {} ?", op.sql()),
            Predicate::Like { column, .. } => format!("{column} LIKE ? ESCAPE '\\'"),
            Predicate::Between { column, low, high } => match (low, high) {
                (Some((lop, _)), Some((hop, _))) => {
                    format!("({column} {} ? AND {column} {} ?)", lop.sql(), hop.sql())
                }
                (Some((lop, _)), None) => format!("{column} {} ?", lop.sql()),
                (None, Some((hop, _))) => format!("{column} {} ?", hop.sql()),
                (None, None) => "1 = 1".to_string(),
            },
            Predicate::And(left, right) => format!("({} AND {})", left.to_sql(), right.to_sql()),
            Predicate::Or(left, right) => format!("({} OR {})", left.to_sql(), right.to_sql()),
            Predicate::Not(child) => format!("NOT ({})", child.to_sql()),
        }
    }
}

/// Walks an AST bottom-up into a `(Predicate, parameters)` pair against a
/// configured field allow-list.
pub struct Translator<'a> {
    fields: &'a SearchFields,
}

impl<'a> Translator<'a> {
    pub fn new(fields: &'a SearchFields) -> Self {
        Self { fields }
    }

    pub fn translate(&self, query: &Query) -> Result<(Predicate, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let predicate = self.node(query, &mut params)?;
        Ok((predicate, params))
    }

    fn node(&self, query: &Query, params: &mut Vec<SqlValue>) -> Result<Predicate> {
        match query {
            Query::MatchAll => Ok(Predicate::MatchAll),

            Query::FieldMatch { field, value } => {
                let config = self.lookup(field)?;
                let sql_value = match config.kind {
                    FieldKind::Text => SqlValue::Text(value.clone()),
                    FieldKind::Timestamp => {
                        SqlValue::Integer(parse_timestamp(field, value, Bound::Low)?)
                    }
                };
                Ok(Predicate::Compare {
                    column: config.column.clone(),
                    op: CompareOp::Eq,
                    param: push_param(params, sql_value),
                })
            }

            Query::Wildcard { field, pattern } => {
                let config = self.lookup(field)?;
                if config.kind == FieldKind::Timestamp {
                    return Err(SearchError::TypeMismatch {
                        field: field.clone(),
                        value: pattern.clone(),
                        expected: "timestamp",
                    });
                }
                let like = glob_to_like(pattern);
                Ok(Predicate::Like {
                    column: config.column.clone(),
                    param: push_param(params, SqlValue::Text(like)),
                })
            }

            Query::Range {
                field,
                low,
                high,
                low_inclusive,
                high_inclusive,
            } => {
                let config = self.lookup(field)?;
                let low = low
                    .as_deref()
                    .map(|v| {
                        let op = if *low_inclusive {
                            CompareOp::Gte
                        } else {
                            CompareOp::Gt
                        };
                        let value = self.range_value(config.kind, field, v, Bound::Low)?;
                        Ok::<_, SearchError>((op, push_param(params, value)))
                    })
                    .transpose()?;
                let high = high
                    .as_deref()
                    .map(|v| {
                        let op = if *high_inclusive {
                            CompareOp::Lte
                        } else {
                            CompareOp::Lt
                        };
                        // An inclusive date-only upper bound covers the
                        // whole day, so 2025-01-31 keeps all of Jan 31.
                        let bound = if *high_inclusive {
                            Bound::High
                        } else {
                            Bound::Low
                        };
                        let value = self.range_value(config.kind, field, v, bound)?;
                        Ok::<_, SearchError>((op, push_param(params, value)))
                    })
                    .transpose()?;
                if low.is_none() && high.is_none() {
                    return Ok(Predicate::MatchAll);
                }
                Ok(Predicate::Between {
                    column: config.column.clone(),
                    low,
                    high,
                })
            }

            Query::FreeText { text } => {
                let like = format!("%{}%", escape_like(text));
                Ok(Predicate::Like {
                    column: self.fields.free_text_column().to_string(),
                    param: push_param(params, SqlValue::Text(like)),
                })
            }

            Query::And(left, right) => {
                let left = self.node(left, params)?;
                let right = self.node(right, params)?;
                Ok(Predicate::And(Box::new(left), Box::new(right)))
            }
            Query::Or(left, right) => {
                let left = self.node(left, params)?;
                let right = self.node(right, params)?;
                Ok(Predicate::Or(Box::new(left), Box::new(right)))
            }
            Query::Not(child) => {
                let child = self.node(child, params)?;
                Ok(Predicate::Not(Box::new(child)))
            }
        }
    }

    fn lookup(&self, field: &str) -> Result<&crate::config::FieldConfig> {
        self.fields
            .get(field)
            .ok_or_else(|| SearchError::UnknownField(field.to_string()))
    }

    fn range_value(
        &self,
        kind: FieldKind,
        field: &str,
        value: &str,
        bound: Bound,
    ) -> Result<SqlValue> {
        match kind {
            FieldKind::Text => Ok(SqlValue::Text(value.to_string())),
            FieldKind::Timestamp => Ok(SqlValue::Integer(parse_timestamp(field, value, bound)?)),
        }
    }
}

fn push_param(params: &mut Vec<SqlValue>, value: SqlValue) -> usize {
    params.push(value);
    params.len() - 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// Date-only values expand to the start of the day.
    Low,
    /// Date-only values expand to the last nanosecond of the day.
    High,
}

/// Parses a user-supplied timestamp into i64 nanoseconds since the epoch.
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC), or
/// a bare `YYYY-MM-DD` date.
fn parse_timestamp(field: &str, value: &str, bound: Bound) -> Result<i64> {
    let mismatch = || SearchError::TypeMismatch {
        field: field.to_string(),
        value: value.to_string(),
        expected: "timestamp",
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.timestamp_nanos_opt().ok_or_else(mismatch);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc().timestamp_nanos_opt().ok_or_else(mismatch);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = match bound {
            Bound::Low => date.and_hms_opt(0, 0, 0),
            Bound::High => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
        }
        .ok_or_else(mismatch)?;
        return naive.and_utc().timestamp_nanos_opt().ok_or_else(mismatch);
    }
    Err(mismatch())
}

/// Rewrites a glob pattern (`*` any run, `?` one char) to LIKE syntax,
/// escaping literal `%`, `_` and `\` first so user text cannot widen the
/// match. Used with `ESCAPE '\'`.
fn glob_to_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '*' => out.push('%'),
            '?' => out.push('_'),
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes LIKE metacharacters without any glob expansion; free-text terms
/// are always literal substrings.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}
