use super::tokenizer::{tokenize, TokenKind};
use super::translator::{SqlValue, Translator};
use super::{parse, Query};
use crate::config::SearchFields;
use crate::error::SearchError;
use chrono::{TimeZone, Utc};

fn field(name: &str, value: &str) -> Query {
    Query::FieldMatch {
        field: name.to_string(),
        value: value.to_string(),
    }
}

fn text(t: &str) -> Query {
    Query::FreeText {
        text: t.to_string(),
    }
}

#[test]
fn tokenize_field_clause() {
    let tokens = tokenize("level:error");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Field,
            TokenKind::Colon,
            TokenKind::Value,
            TokenKind::Eof
        ]
    );
    assert_eq!(tokens[0].text, "level");
    assert_eq!(tokens[2].text, "error");
}

#[test]
fn tokenize_wildcard_value() {
    let tokens = tokenize("service:api-*");
    assert_eq!(tokens[2].kind, TokenKind::WildcardValue);
    assert_eq!(tokens[2].text, "api-*");
}

#[test]
fn tokenize_quoted_value_with_escapes() {
    let tokens = tokenize(r#"message:"a \"quoted\" phrase""#);
    assert_eq!(tokens[2].kind, TokenKind::QuotedValue);
    assert_eq!(tokens[2].text, "a \"quoted\" phrase");
}

#[test]
fn tokenize_unterminated_quote_is_error_marker() {
    let tokens = tokenize("message:\"oops");
    let err = tokens.iter().find(|t| t.kind == TokenKind::Error).unwrap();
    assert_eq!(err.position, 8);
}

#[test]
fn tokenize_keywords_are_case_sensitive() {
    // Uppercase AND is an operator; lowercase 'and' is an ordinary term.
    // Saved queries depend on the lowercase form matching literally.
    let upper = tokenize("a AND b");
    assert_eq!(upper[1].kind, TokenKind::And);

    let lower = tokenize("a and b");
    assert_eq!(lower[1].kind, TokenKind::Value);
    assert_eq!(lower[1].text, "and");
}

#[test]
fn tokenize_timestamp_value_keeps_colons() {
    let tokens = tokenize("timestamp:2025-01-01T10:30:00Z");
    assert_eq!(tokens[0].kind, TokenKind::Field);
    assert_eq!(tokens[2].kind, TokenKind::Value);
    assert_eq!(tokens[2].text, "2025-01-01T10:30:00Z");
}

#[test]
fn tokenize_mismatched_range_brackets() {
    let tokens = tokenize("price:[10 TO 20}");
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
}

#[test]
fn parse_field_match() {
    let ast = parse("level:error").unwrap();
    assert_eq!(ast, field("level", "error"));
}

#[test]
fn parse_explicit_and() {
    let ast = parse("level:error AND service:api").unwrap();
    assert_eq!(
        ast,
        Query::And(
            Box::new(field("level", "error")),
            Box::new(field("service", "api"))
        )
    );
}

#[test]
fn parse_implicit_and_on_adjacency() {
    let explicit = parse("level:error AND service:api").unwrap();
    let implicit = parse("level:error service:api").unwrap();
    assert_eq!(explicit, implicit);
}

#[test]
fn parse_or_binds_looser_than_and() {
    let ast = parse("level:error OR level:warn AND service:api").unwrap();
    assert_eq!(
        ast,
        Query::Or(
            Box::new(field("level", "error")),
            Box::new(Query::And(
                Box::new(field("level", "warn")),
                Box::new(field("service", "api"))
            ))
        )
    );
}

#[test]
fn parse_not_binds_tighter_than_and() {
    let ast = parse("NOT level:debug service:api").unwrap();
    assert_eq!(
        ast,
        Query::And(
            Box::new(Query::Not(Box::new(field("level", "debug")))),
            Box::new(field("service", "api"))
        )
    );
}

#[test]
fn parse_grouping_overrides_precedence() {
    let ast = parse("(level:error OR level:warn) AND service:api").unwrap();
    assert_eq!(
        ast,
        Query::And(
            Box::new(Query::Or(
                Box::new(field("level", "error")),
                Box::new(field("level", "warn"))
            )),
            Box::new(field("service", "api"))
        )
    );
}

#[test]
fn parse_lowercase_keywords_are_terms() {
    let ast = parse("not error").unwrap();
    assert_eq!(
        ast,
        Query::And(Box::new(text("not")), Box::new(text("error")))
    );
}

#[test]
fn parse_inclusive_range() {
    let ast = parse("timestamp:[2025-01-01 TO 2025-01-31]").unwrap();
    assert_eq!(
        ast,
        Query::Range {
            field: "timestamp".to_string(),
            low: Some("2025-01-01".to_string()),
            high: Some("2025-01-31".to_string()),
            low_inclusive: true,
            high_inclusive: true,
        }
    );
}

#[test]
fn parse_exclusive_range() {
    let ast = parse("timestamp:{2025-01-01 TO 2025-01-31}").unwrap();
    match ast {
        Query::Range {
            low_inclusive,
            high_inclusive,
            ..
        } => {
            assert!(!low_inclusive);
            assert!(!high_inclusive);
        }
        other => panic!("expected Range, got {other:?}"),
    }
}

#[test]
fn parse_open_range_bound() {
    let ast = parse("timestamp:[2025-01-01 TO *]").unwrap();
    match ast {
        Query::Range { low, high, .. } => {
            assert_eq!(low, Some("2025-01-01".to_string()));
            assert_eq!(high, None);
        }
        other => panic!("expected Range, got {other:?}"),
    }
}

#[test]
fn parse_lowercase_to_in_range() {
    // TO is caseless inside a range, unlike the boolean keywords.
    let ast = parse("timestamp:[2025-01-01 to 2025-01-31]").unwrap();
    assert!(matches!(ast, Query::Range { .. }));
}

#[test]
fn parse_wildcard_clause() {
    let ast = parse("message:*timeout*").unwrap();
    assert_eq!(
        ast,
        Query::Wildcard {
            field: "message".to_string(),
            pattern: "*timeout*".to_string(),
        }
    );
}

#[test]
fn parse_quoted_phrase_free_text() {
    let ast = parse("\"connection reset by peer\"").unwrap();
    assert_eq!(ast, text("connection reset by peer"));
}

#[test]
fn parse_empty_is_match_all() {
    assert_eq!(parse("").unwrap(), Query::MatchAll);
    assert_eq!(parse("   ").unwrap(), Query::MatchAll);
}

#[test]
fn parse_error_reports_position() {
    let err = parse("level:error AND").unwrap_err();
    match err {
        SearchError::Syntax {
            position, found, ..
        } => {
            assert_eq!(position, 15);
            assert_eq!(found, "end of query");
        }
        other => panic!("expected Syntax, got {other:?}"),
    }
}

#[test]
fn parse_error_unclosed_paren() {
    assert!(parse("(level:error OR level:warn").is_err());
}

#[test]
fn parse_error_missing_to() {
    assert!(parse("timestamp:[2025-01-01 2025-01-31]").is_err());
}

#[test]
fn parse_error_missing_value() {
    assert!(parse("level:").is_err());
}

#[test]
fn parse_error_dangling_rparen() {
    assert!(parse("level:error)").is_err());
}

#[test]
fn parse_error_unterminated_quote() {
    let err = parse("message:\"oops").unwrap_err();
    assert!(matches!(err, SearchError::Syntax { .. }));
}

#[test]
fn parse_never_repairs_to_match_all() {
    // A broken query must fail loudly instead of returning everything.
    for broken in ["level:", "(a OR", "timestamp:[1 TO", "x:[1 TO 2}"] {
        let result = parse(broken);
        assert!(result.is_err(), "{broken:?} should not parse");
    }
}

#[test]
fn display_round_trips_structurally() {
    let queries = [
        "level:error",
        "level:error AND service:api",
        "level:error service:api",
        "(level:error OR level:warn) AND service:api",
        "NOT level:debug",
        "NOT (level:debug OR level:trace)",
        "NOT (NOT level:debug)",
        "message:*timeout*",
        "timestamp:[2025-01-01 TO 2025-01-31]",
        "timestamp:{2025-01-01 TO *}",
        "\"connection reset\" level:error",
        "user_id:u-123 OR user_id:u-456 OR user_id:u-789",
    ];
    for raw in queries {
        let ast = parse(raw).unwrap();
        let canonical = ast.to_string();
        let reparsed = parse(&canonical).unwrap();
        assert_eq!(ast, reparsed, "round-trip failed for {raw:?} via {canonical:?}");
    }
}

#[test]
fn display_normalizes_implicit_and() {
    let implicit = parse("level:error service:api").unwrap();
    let explicit = parse("level:error AND service:api").unwrap();
    assert_eq!(implicit.to_string(), explicit.to_string());
}

#[test]
fn translate_field_match() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("level:error").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "level = ?");
    assert_eq!(params, vec![SqlValue::Text("error".to_string())]);
}

#[test]
fn translate_boolean_structure() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("level:error AND NOT service:api").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "(level = ? AND NOT (service = ?))");
    assert_eq!(params.len(), 2);
}

#[test]
fn translate_keeps_literals_out_of_sql() {
    // Injection safety: metacharacter-laden values must only ever appear
    // in the parameter list, never in the rendered predicate.
    let fields = SearchFields::default();
    let hostile = [
        "service:\"'; DROP TABLE logs; --\"",
        "message:\"50%_off\"",
        "\"' OR '1'='1\"",
    ];
    for raw in hostile {
        let ast = parse(raw).unwrap();
        let (predicate, params) = Translator::new(&fields).translate(&ast).unwrap();
        let sql = predicate.to_sql();
        for param in &params {
            if let SqlValue::Text(value) = param {
                let stripped: String = value.chars().filter(|c| *c != '\\').collect();
                assert!(
                    !sql.contains(stripped.trim_matches('%')),
                    "literal {value:?} leaked into {sql:?}"
                );
            }
        }
        assert!(!sql.contains("DROP"), "literal leaked into {sql:?}");
    }
}

#[test]
fn translate_wildcard_glob_rewrite() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("service:api-*").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "service LIKE ? ESCAPE '\\'");
    assert_eq!(params, vec![SqlValue::Text("api-%".to_string())]);
}

#[test]
fn translate_wildcard_escapes_literal_metacharacters() {
    // A user-typed literal percent sign must not widen the match.
    let fields = SearchFields::default();
    let (_, params) = Translator::new(&fields)
        .translate(&parse("service:api-100%*").unwrap())
        .unwrap();
    assert_eq!(params, vec![SqlValue::Text("api-100\\%%".to_string())]);

    let (_, params) = Translator::new(&fields)
        .translate(&parse("message:a_b?").unwrap())
        .unwrap();
    assert_eq!(params, vec![SqlValue::Text("a\\_b_".to_string())]);
}

#[test]
fn translate_literal_percent_value_is_equality() {
    // Without a glob marker this is a plain value, bound verbatim.
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("service:api-100%").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "service = ?");
    assert_eq!(params, vec![SqlValue::Text("api-100%".to_string())]);
}

#[test]
fn translate_free_text_is_escaped_substring() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("timeout").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "message LIKE ? ESCAPE '\\'");
    assert_eq!(params, vec![SqlValue::Text("%timeout%".to_string())]);

    let (_, params) = Translator::new(&fields)
        .translate(&parse("\"100%_done\"").unwrap())
        .unwrap();
    assert_eq!(params, vec![SqlValue::Text("%100\\%\\_done%".to_string())]);
}

#[test]
fn translate_timestamp_range_expands_dates() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("timestamp:[2025-01-01 TO 2025-01-31]").unwrap())
        .unwrap();
    assert_eq!(
        predicate.to_sql(),
        "(timestamp >= ? AND timestamp <= ?)"
    );
    let low = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .unwrap()
        .timestamp_nanos_opt()
        .unwrap();
    let high = Utc
        .with_ymd_and_hms(2025, 1, 31, 23, 59, 59)
        .unwrap()
        .timestamp_nanos_opt()
        .unwrap()
        + 999_999_999;
    assert_eq!(params, vec![SqlValue::Integer(low), SqlValue::Integer(high)]);
}

#[test]
fn translate_open_bound_omits_comparator() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&parse("timestamp:[2025-01-01 TO *]").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "timestamp >= ?");
    assert_eq!(params.len(), 1);
}

#[test]
fn translate_exclusive_range_comparators() {
    let fields = SearchFields::default();
    let (predicate, _) = Translator::new(&fields)
        .translate(&parse("timestamp:{2025-01-01T00:00:00Z TO 2025-02-01T00:00:00Z}").unwrap())
        .unwrap();
    assert_eq!(predicate.to_sql(), "(timestamp > ? AND timestamp < ?)");
}

#[test]
fn translate_unknown_field() {
    let fields = SearchFields::default();
    let err = Translator::new(&fields)
        .translate(&parse("hostname:web-1").unwrap())
        .unwrap_err();
    match err {
        SearchError::UnknownField(name) => assert_eq!(name, "hostname"),
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

#[test]
fn translate_timestamp_type_mismatch() {
    let fields = SearchFields::default();
    let err = Translator::new(&fields)
        .translate(&parse("timestamp:yesterday").unwrap())
        .unwrap_err();
    match err {
        SearchError::TypeMismatch { field, .. } => assert_eq!(field, "timestamp"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn translate_match_all() {
    let fields = SearchFields::default();
    let (predicate, params) = Translator::new(&fields)
        .translate(&Query::MatchAll)
        .unwrap();
    assert_eq!(predicate.to_sql(), "1 = 1");
    assert!(params.is_empty());
}

#[test]
fn translate_params_follow_tree_order() {
    let fields = SearchFields::default();
    let (_, params) = Translator::new(&fields)
        .translate(&parse("level:a service:b user_id:c").unwrap())
        .unwrap();
    assert_eq!(
        params,
        vec![
            SqlValue::Text("a".to_string()),
            SqlValue::Text("b".to_string()),
            SqlValue::Text("c".to_string()),
        ]
    );
}
