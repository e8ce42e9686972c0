use std::fmt;

/// Parsed query AST. Nodes are immutable; the parser is the only
/// constructor and nothing mutates a node afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Sentinel for an empty query string: matches every record.
    MatchAll,
    /// Exact field equality, `level:error`.
    FieldMatch { field: String, value: String },
    /// Glob pattern on a field, `service:api-*` (`*` any run, `?` one char).
    Wildcard { field: String, pattern: String },
    /// `field:[low TO high]` / `field:{low TO high}`; open bounds are None.
    Range {
        field: String,
        low: Option<String>,
        high: Option<String>,
        low_inclusive: bool,
        high_inclusive: bool,
    },
    /// Unscoped term matched against the free-text column.
    FreeText { text: String },
    And(Box<Query>, Box<Query>),
    Or(Box<Query>, Box<Query>),
    Not(Box<Query>),
}

impl Query {
    /// Binding strength, used by `Display` to decide parenthesization.
    fn precedence(&self) -> u8 {
        match self {
            Query::Or(_, _) => 1,
            Query::And(_, _) => 2,
            Query::Not(_) => 3,
            _ => 4,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parent: u8, is_right: bool) -> fmt::Result {
        let mine = self.precedence();
        // A right child at equal precedence must keep its grouping, since
        // reparsing without parens would rebuild the tree left-associated.
        let needs_parens = mine < parent || (is_right && mine == parent);
        if needs_parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || matches!(value, "AND" | "OR" | "NOT")
        || value.eq_ignore_ascii_case("TO")
        || value.chars().any(|c| {
            c.is_whitespace()
                || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ':' | '*' | '?')
        })
}

/// Writes a value in query syntax, quoting it when it would not survive
/// re-tokenization as a single plain value.
fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if needs_quoting(value) {
        write!(f, "\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        f.write_str(value)
    }
}

fn write_bound(f: &mut fmt::Formatter<'_>, bound: Option<&str>) -> fmt::Result {
    match bound {
        Some(v) => write_value(f, v),
        None => f.write_str("*"),
    }
}

/// Canonical query-syntax rendering. `parse(q.to_string())` rebuilds a
/// structurally equal AST; this form is also the normalized cache-key
/// input, so `a AND b` and `a b` normalize identically.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::MatchAll => Ok(()),
            Query::FieldMatch { field, value } => {
                write!(f, "{field}:")?;
                write_value(f, value)
            }
            Query::Wildcard { field, pattern } => write!(f, "{field}:{pattern}"),
            Query::Range {
                field,
                low,
                high,
                low_inclusive,
                high_inclusive,
            } => {
                write!(f, "{field}:{}", if *low_inclusive { '[' } else { '{' })?;
                write_bound(f, low.as_deref())?;
                f.write_str(" TO ")?;
                write_bound(f, high.as_deref())?;
                write!(f, "{}", if *high_inclusive { ']' } else { '}' })
            }
            Query::FreeText { text } => write_value(f, text),
            Query::And(left, right) => {
                left.fmt_child(f, 2, false)?;
                f.write_str(" AND ")?;
                right.fmt_child(f, 2, true)
            }
            Query::Or(left, right) => {
                left.fmt_child(f, 1, false)?;
                f.write_str(" OR ")?;
                right.fmt_child(f, 1, true)
            }
            Query::Not(child) => {
                f.write_str("NOT ")?;
                // A nested NOT also needs parens: NOT applies to a single
                // primary, so "NOT NOT x" does not reparse.
                child.fmt_child(f, 3, true)
            }
        }
    }
}
