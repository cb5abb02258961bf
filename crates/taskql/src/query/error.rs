//! Error types for query parsing and evaluation.
//!
//! Plain parsing never fails. These errors surface through the diagnostics
//! channel and through strict parsing.

use thiserror::Error;

/// A specialized Result type for strict query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Problems found while reading a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// A character the lexer does not understand was skipped.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The skipped character.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// A token appeared where it cannot be used.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Source text of the token.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// The query ended where more input was required.
    #[error("unexpected end of query at position {position}")]
    UnexpectedEndOfInput {
        /// Byte offset of the end of input.
        position: usize,
    },

    /// A field name was not followed by an operator.
    #[error("no comparison operator after field '{field}'")]
    MissingOperator {
        /// The field name.
        field: String,
    },

    /// An operator was not followed by a value.
    #[error("no value after '{field} {operator}'")]
    MissingValue {
        /// The field name, or the empty string for dependency shortcuts.
        field: String,
        /// The operator text.
        operator: String,
    },

    /// An opening parenthesis was never closed.
    #[error("unclosed parenthesis opened at position {position}")]
    UnclosedParenthesis {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// A clause that may appear only once was repeated.
    #[error("duplicate '{clause}' clause ignored")]
    DuplicateClause {
        /// `sort` or `group`.
        clause: String,
    },

    /// A field name matches nothing the vocabulary knows.
    #[error("unknown field '{field}'{}", suggestion_suffix(.suggestion))]
    UnknownField {
        /// The field name as written.
        field: String,
        /// The closest known field, if any is close enough.
        suggestion: Option<String>,
    },

    /// A `matches` pattern does not compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(", did you mean '{name}'?"),
        None => String::new(),
    }
}

impl QueryError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        QueryError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates a missing operator error.
    pub fn missing_operator(field: impl Into<String>) -> Self {
        QueryError::MissingOperator {
            field: field.into(),
        }
    }

    /// Creates a missing value error.
    pub fn missing_value(field: impl Into<String>, operator: impl Into<String>) -> Self {
        QueryError::MissingValue {
            field: field.into(),
            operator: operator.into(),
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_message_with_suggestion() {
        let err = QueryError::UnknownField {
            field: "stauts".to_string(),
            suggestion: Some("status".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown field 'stauts', did you mean 'status'?"
        );
    }

    #[test]
    fn test_unknown_field_message_without_suggestion() {
        let err = QueryError::UnknownField {
            field: "zzz".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown field 'zzz'");
    }

    #[test]
    fn test_missing_value_message() {
        let err = QueryError::missing_value("status", "is");
        assert_eq!(err.to_string(), "no value after 'status is'");
    }
}
