//! Recursive descent parser for query expressions.

use super::ast::{
    DependencyCheck, GroupKey, Operator, ParsedQuery, QueryNode, SortDirection, SortKey,
};
use super::error::{QueryError, QueryResult};
use super::evaluator::build_pattern;
use super::lexer::{Connective, Keyword, Lexer, Relation, Token, TokenKind};
use super::vocabulary::{Vocabulary, STATUS_FIELD};

/// A parsed query together with everything the parser had to forgive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    /// The query, built with the lenient rules.
    pub query: ParsedQuery,
    /// Skipped characters first, then parser problems in the order found,
    /// then patterns that do not compile.
    pub diagnostics: Vec<QueryError>,
}

/// Parser for query expressions.
///
/// # Grammar
///
/// ```text
/// query      ::= expression? sort_clause? group_clause?
/// expression ::= or_expr
/// or_expr    ::= and_expr ("OR" and_expr)*
/// and_expr   ::= not_expr ("AND" not_expr)*
/// not_expr   ::= "NOT" not_expr | primary
/// primary    ::= "(" expression ")" | shortcut | comparison | status_word
/// comparison ::= IDENTIFIER OPERATOR (STRING | DATE | TAG | IDENTIFIER)
/// shortcut   ::= "is" ["not"] ("blocked" | "blocking")
///              | "depends on" value | "blocks" value
/// sort_clause  ::= "sort" "by" (IDENTIFIER ("asc" | "desc")? ","?)+
/// group_clause ::= "group" "by" IDENTIFIER
/// ```
///
/// Parsing is lenient: a malformed sub-expression becomes "no filter", so a
/// half-typed query matches everything instead of failing. Use
/// [`QueryParser::parse_strict`] to reject such input instead.
///
/// # Example
///
/// ```
/// use taskql::query::{QueryNode, QueryParser};
///
/// let query = QueryParser::parse("status is done OR is blocked");
/// assert!(matches!(query.filter, Some(QueryNode::Logical { .. })));
///
/// let query = QueryParser::parse("status is");
/// assert!(query.filter.is_none());
/// ```
pub struct QueryParser<'v> {
    tokens: Vec<Token>,
    position: usize,
    vocabulary: &'v Vocabulary,
    diagnostics: Vec<QueryError>,
}

impl<'v> QueryParser<'v> {
    /// Parses a query with the default vocabulary.
    pub fn parse(input: &str) -> ParsedQuery {
        QueryParser::parse_with(input, &Vocabulary::default())
    }

    /// Parses a query with the given vocabulary.
    pub fn parse_with(input: &str, vocabulary: &Vocabulary) -> ParsedQuery {
        QueryParser::parse_with_diagnostics(input, vocabulary).query
    }

    /// Parses a query and reports everything that was forgiven along the way.
    pub fn parse_with_diagnostics(input: &str, vocabulary: &Vocabulary) -> ParseOutcome {
        let lexed = Lexer::new(input).tokenize_with_errors();
        let outcome = QueryParser::parse_tokens(lexed.tokens, vocabulary);

        let mut diagnostics: Vec<QueryError> = lexed
            .errors
            .into_iter()
            .map(|e| QueryError::UnexpectedCharacter {
                character: e.character,
                position: e.position,
            })
            .collect();
        diagnostics.extend(outcome.diagnostics);
        if let Some(filter) = &outcome.query.filter {
            filter.for_each_comparison(&mut |_, operator, value| {
                if matches!(operator, Operator::Matches | Operator::NotMatches) {
                    if let Err(reason) = build_pattern(value) {
                        diagnostics.push(QueryError::invalid_pattern(value, reason));
                    }
                }
            });
        }

        ParseOutcome {
            query: outcome.query,
            diagnostics,
        }
    }

    /// Parses a query, failing on the first problem found.
    ///
    /// # Errors
    ///
    /// Returns the first diagnostic that lenient parsing would have forgiven.
    pub fn parse_strict(input: &str, vocabulary: &Vocabulary) -> QueryResult<ParsedQuery> {
        let outcome = QueryParser::parse_with_diagnostics(input, vocabulary);
        match outcome.diagnostics.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(outcome.query),
        }
    }

    /// Parses an already tokenized query.
    ///
    /// A missing trailing end-of-input token is tolerated.
    pub fn parse_tokens(mut tokens: Vec<Token>, vocabulary: &'v Vocabulary) -> ParseOutcome {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EndOfInput) {
            let end = tokens
                .last()
                .map(|t| t.position + t.text.len())
                .unwrap_or(0);
            tokens.push(Token {
                kind: TokenKind::EndOfInput,
                text: String::new(),
                position: end,
            });
        }

        let mut parser = Self {
            tokens,
            position: 0,
            vocabulary,
            diagnostics: Vec::new(),
        };
        let query = parser.parse_query();
        ParseOutcome {
            query,
            diagnostics: parser.diagnostics,
        }
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> &Token {
        // The stream always ends with EndOfInput, which is never consumed.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Returns the kind of the current token.
    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::EndOfInput {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token is of the expected kind.
    fn check(&self, expected: TokenKind) -> bool {
        self.peek_kind() == expected
    }

    fn report(&mut self, error: QueryError) {
        self.diagnostics.push(error);
    }

    fn report_unexpected(&mut self, token: &Token) {
        let error = match token.kind {
            TokenKind::EndOfInput => QueryError::UnexpectedEndOfInput {
                position: token.position,
            },
            _ => QueryError::unexpected_token(&token.text, token.position),
        };
        self.report(error);
    }

    /// Parses the whole query: an optional filter followed by clauses.
    fn parse_query(&mut self) -> ParsedQuery {
        let mut query = ParsedQuery::default();
        let mut expression_done = false;
        let mut sort_seen = false;

        loop {
            match self.peek_kind() {
                TokenKind::EndOfInput => break,
                TokenKind::Keyword(Keyword::Sort) => {
                    let keys = self.parse_sort_clause();
                    if sort_seen {
                        self.report(QueryError::DuplicateClause {
                            clause: "sort".to_string(),
                        });
                    } else {
                        query.sort = keys;
                        sort_seen = true;
                    }
                    expression_done = true;
                }
                TokenKind::Keyword(Keyword::Group) => {
                    let group = self.parse_group_clause();
                    if query.group.is_some() {
                        self.report(QueryError::DuplicateClause {
                            clause: "group".to_string(),
                        });
                    } else {
                        query.group = group;
                    }
                    expression_done = true;
                }
                _ if !expression_done => {
                    query.filter = self.parse_expression();
                    expression_done = true;
                }
                _ => {
                    let token = self.advance();
                    self.report_unexpected(&token);
                }
            }
        }

        query
    }

    /// Parses the top-level expression (OR expression).
    fn parse_expression(&mut self) -> Option<QueryNode> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("OR" and_expr)*`
    ///
    /// A side that parsed to nothing matches everything, and so does the OR.
    fn parse_or_expr(&mut self) -> Option<QueryNode> {
        let mut left = self.parse_and_expr();

        while self.check(TokenKind::Connective(Connective::Or)) {
            self.advance();
            let right = self.parse_and_expr();
            left = match (left, right) {
                (Some(l), Some(r)) => Some(QueryNode::or(l, r)),
                _ => None,
            };
        }

        left
    }

    /// Parses AND expressions: `not_expr ("AND" not_expr)*`
    fn parse_and_expr(&mut self) -> Option<QueryNode> {
        let mut left = self.parse_not_expr();

        while self.check(TokenKind::Connective(Connective::And)) {
            self.advance();
            let right = self.parse_not_expr();
            left = match (left, right) {
                (Some(l), Some(r)) => Some(QueryNode::and(l, r)),
                (Some(node), None) | (None, Some(node)) => Some(node),
                (None, None) => None,
            };
        }

        left
    }

    /// Parses NOT expressions: `"NOT" not_expr | primary`
    fn parse_not_expr(&mut self) -> Option<QueryNode> {
        if self.check(TokenKind::Connective(Connective::Not)) {
            self.advance();
            return self.parse_not_expr().map(QueryNode::negate);
        }

        self.parse_primary()
    }

    /// Parses a parenthesised expression, shortcut, comparison or status word.
    fn parse_primary(&mut self) -> Option<QueryNode> {
        match self.peek_kind() {
            TokenKind::LeftParen => {
                let open = self.advance();
                let inner = self.parse_expression();
                if self.check(TokenKind::RightParen) {
                    self.advance();
                } else {
                    self.report(QueryError::UnclosedParenthesis {
                        position: open.position,
                    });
                }
                inner
            }
            TokenKind::Operator(_) | TokenKind::Relation(_) => self.parse_shortcut(),
            TokenKind::Identifier => self.parse_comparison(),

            // Left for the enclosing rule to deal with.
            TokenKind::EndOfInput
            | TokenKind::RightParen
            | TokenKind::Connective(_)
            | TokenKind::Keyword(Keyword::Sort | Keyword::Group) => {
                let token = self.peek().clone();
                self.report_unexpected(&token);
                None
            }

            _ => {
                let token = self.advance();
                self.report_unexpected(&token);
                None
            }
        }
    }

    /// Parses a dependency shortcut such as `is blocked` or `depends on X`.
    fn parse_shortcut(&mut self) -> Option<QueryNode> {
        let operator = self.advance();

        match operator.kind {
            TokenKind::Operator(op @ (Operator::Is | Operator::IsNot)) => {
                let target = self.peek().clone();
                let state = (target.kind == TokenKind::Identifier)
                    .then(|| target.text.to_lowercase());
                let node = match (op, state.as_deref()) {
                    (Operator::Is, Some("blocked")) => {
                        QueryNode::dependency(DependencyCheck::Blocked)
                    }
                    (Operator::IsNot, Some("blocked")) => {
                        QueryNode::dependency(DependencyCheck::NotBlocked)
                    }
                    (Operator::Is, Some("blocking")) => {
                        QueryNode::dependency(DependencyCheck::Blocking)
                    }
                    (Operator::IsNot, Some("blocking")) => {
                        QueryNode::negate(QueryNode::dependency(DependencyCheck::Blocking))
                    }
                    _ => {
                        self.report(QueryError::unexpected_token(
                            &operator.text,
                            operator.position,
                        ));
                        return None;
                    }
                };
                self.advance();
                Some(node)
            }
            TokenKind::Relation(relation) => {
                let Some(target) = self.parse_value() else {
                    self.report(QueryError::missing_value("", &operator.text));
                    return None;
                };
                let check = match relation {
                    Relation::DependsOn => DependencyCheck::DependsOn(target),
                    Relation::Blocks => DependencyCheck::Blocks(target),
                };
                Some(QueryNode::dependency(check))
            }
            _ => {
                self.report(QueryError::unexpected_token(
                    &operator.text,
                    operator.position,
                ));
                None
            }
        }
    }

    /// Parses `field operator value`, or a bare status word.
    fn parse_comparison(&mut self) -> Option<QueryNode> {
        let field = self.advance();

        let operator = match self.peek_kind() {
            TokenKind::Operator(op) => op,
            _ if self.vocabulary.is_status_word(&field.text) => {
                return Some(QueryNode::comparison(
                    STATUS_FIELD,
                    Operator::Is,
                    field.text.to_lowercase(),
                ));
            }
            _ => {
                self.report(QueryError::missing_operator(&field.text));
                return None;
            }
        };
        let operator_token = self.advance();

        let Some(value) = self.parse_value() else {
            self.report(QueryError::missing_value(&field.text, &operator_token.text));
            return None;
        };

        self.check_field(&field.text);
        Some(QueryNode::comparison(field.text, operator, value))
    }

    /// Consumes a value token if one is next.
    fn parse_value(&mut self) -> Option<String> {
        match self.peek_kind() {
            TokenKind::Identifier
            | TokenKind::StringLiteral
            | TokenKind::DateLiteral
            | TokenKind::TagLiteral
            | TokenKind::Keyword(Keyword::By | Keyword::Asc | Keyword::Desc) => {
                Some(self.advance().text)
            }
            _ => None,
        }
    }

    /// Reports fields the vocabulary does not know.
    fn check_field(&mut self, field: &str) {
        if !self.vocabulary.is_known_field(field) {
            let suggestion = self.vocabulary.suggest_field(field);
            self.report(QueryError::UnknownField {
                field: field.to_string(),
                suggestion,
            });
        }
    }

    /// Consumes an optional `by` after `sort` or `group`.
    fn expect_by(&mut self) {
        if self.check(TokenKind::Keyword(Keyword::By)) {
            self.advance();
        } else {
            let token = self.peek().clone();
            self.report_unexpected(&token);
        }
    }

    /// Parses `sort by field [asc|desc], ...`.
    fn parse_sort_clause(&mut self) -> Vec<SortKey> {
        self.advance(); // consume 'sort'
        self.expect_by();

        let mut keys = Vec::new();
        while self.check(TokenKind::Identifier) {
            let field = self.advance().text;
            let direction = match self.peek_kind() {
                TokenKind::Keyword(Keyword::Asc) => {
                    self.advance();
                    SortDirection::Asc
                }
                TokenKind::Keyword(Keyword::Desc) => {
                    self.advance();
                    SortDirection::Desc
                }
                _ => SortDirection::Asc,
            };
            self.check_field(&field);
            keys.push(SortKey::new(field, direction));
        }

        if keys.is_empty() {
            let token = self.peek().clone();
            self.report_unexpected(&token);
        }
        keys
    }

    /// Parses `group by field`.
    fn parse_group_clause(&mut self) -> Option<GroupKey> {
        self.advance(); // consume 'group'
        self.expect_by();

        if self.check(TokenKind::Identifier) {
            let field = self.advance().text;
            self.check_field(&field);
            Some(GroupKey::new(field))
        } else {
            let token = self.peek().clone();
            self.report_unexpected(&token);
            None
        }
    }
}
