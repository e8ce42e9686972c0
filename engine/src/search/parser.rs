use super::ast::Query;
use super::tokenizer::{tokenize, Token, TokenKind};
use crate::error::SearchError;

/// Parses a raw query string into its AST.
///
/// Empty (or all-whitespace) input parses to `Query::MatchAll`; returning
/// everything for "no filter" is the documented default. Anything else that
/// fails the grammar is a `SearchError::Syntax`; the parser never repairs a
/// broken query into a best-effort tree.
pub fn parse(raw: &str) -> Result<Query, SearchError> {
    Parser::new(tokenize(raw)).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The token stream always ends with `Eof`, so indexing is total.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> SearchError {
        let token = self.peek();
        if token.kind == TokenKind::Error {
            return token.to_syntax_error();
        }
        SearchError::Syntax {
            position: token.position,
            expected: expected.to_string(),
            found: match token.kind {
                TokenKind::Eof => "end of query".to_string(),
                _ => format!("'{}'", token.text),
            },
        }
    }

    fn parse(&mut self) -> Result<Query, SearchError> {
        if self.peek_kind() == TokenKind::Eof {
            return Ok(Query::MatchAll);
        }
        let query = self.or_expr()?;
        match self.peek_kind() {
            TokenKind::Eof => Ok(query),
            _ => Err(self.error("end of query")),
        }
    }

    fn or_expr(&mut self) -> Result<Query, SearchError> {
        let mut left = self.and_expr()?;
        while self.peek_kind() == TokenKind::Or {
            self.advance();
            let right = self.and_expr()?;
            left = Query::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `and_expr := not_expr (AND? not_expr)*`. Adjacency without an
    /// operator is an implicit AND, resolved by looking ahead for a token
    /// that can start another clause instead of synthesizing tokens.
    fn and_expr(&mut self) -> Result<Query, SearchError> {
        let mut left = self.not_expr()?;
        loop {
            match self.peek_kind() {
                TokenKind::And => {
                    self.advance();
                }
                kind if Self::starts_clause(&kind) => {}
                _ => break,
            }
            let right = self.not_expr()?;
            left = Query::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_clause(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Not
                | TokenKind::LParen
                | TokenKind::Field
                | TokenKind::Value
                | TokenKind::QuotedValue
                | TokenKind::WildcardValue
        )
    }

    fn not_expr(&mut self) -> Result<Query, SearchError> {
        if self.peek_kind() == TokenKind::Not {
            self.advance();
            let child = self.primary()?;
            return Ok(Query::Not(Box::new(child)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Query, SearchError> {
        match self.peek_kind() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.or_expr()?;
                match self.peek_kind() {
                    TokenKind::RParen => {
                        self.advance();
                        Ok(inner)
                    }
                    _ => Err(self.error("closing ')'")),
                }
            }
            TokenKind::Field => self.field_clause(),
            TokenKind::Value | TokenKind::QuotedValue | TokenKind::WildcardValue => {
                let token = self.advance();
                Ok(Query::FreeText { text: token.text })
            }
            _ => Err(self.error("a clause")),
        }
    }

    fn field_clause(&mut self) -> Result<Query, SearchError> {
        let field = self.advance().text;
        match self.peek_kind() {
            TokenKind::Colon => {
                self.advance();
            }
            _ => return Err(self.error("':'")),
        }

        match self.peek_kind() {
            TokenKind::Value | TokenKind::QuotedValue => {
                let value = self.advance().text;
                Ok(Query::FieldMatch { field, value })
            }
            TokenKind::WildcardValue => {
                let pattern = self.advance().text;
                Ok(Query::Wildcard { field, pattern })
            }
            TokenKind::RangeOpen { inclusive } => self.range_clause(field, inclusive),
            _ => Err(self.error("a value")),
        }
    }

    fn range_clause(&mut self, field: String, low_inclusive: bool) -> Result<Query, SearchError> {
        self.advance(); // opening bracket
        let low = self.range_bound()?;
        match self.peek_kind() {
            TokenKind::RangeTo => {
                self.advance();
            }
            _ => return Err(self.error("'TO'")),
        }
        let high = self.range_bound()?;
        match self.peek_kind() {
            TokenKind::RangeClose { inclusive } => {
                self.advance();
                Ok(Query::Range {
                    field,
                    low,
                    high,
                    low_inclusive,
                    high_inclusive: inclusive,
                })
            }
            _ => Err(self.error("closing range bracket")),
        }
    }

    /// A range bound: a plain or quoted value, or `*` for an open bound.
    fn range_bound(&mut self) -> Result<Option<String>, SearchError> {
        match self.peek_kind() {
            TokenKind::Value | TokenKind::QuotedValue => Ok(Some(self.advance().text)),
            TokenKind::WildcardValue if self.peek().text == "*" => {
                self.advance();
                Ok(None)
            }
            _ => Err(self.error("a range bound")),
        }
    }
}
