//! Lexer (tokenizer) for query expressions.
//!
//! Lexing is total: unknown characters are skipped and reported, and the
//! token stream always ends with [`TokenKind::EndOfInput`].

use tracing::trace;

use super::ast::Operator;

/// Error encountered during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    /// The character that was skipped.
    pub character: char,
    /// The position (0-indexed byte offset) of the character.
    pub position: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unexpected character '{}' at position {}",
            self.character, self.position
        )
    }
}

impl std::error::Error for LexerError {}

/// Result of tokenizing a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens, ending with an end-of-input token.
    pub tokens: Vec<Token>,
    /// Characters that were skipped.
    pub errors: Vec<LexerError>,
}

/// A token with its source text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source text. String literals hold their unquoted contents.
    pub text: String,
    /// Byte offset where the token starts.
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A field name or bare word value.
    Identifier,
    /// A field comparison operator.
    Operator(Operator),
    /// A dependency relation operator (`depends on`, `blocks`).
    Relation(Relation),
    /// `and`, `or`, `not`.
    Connective(Connective),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// A quoted string.
    StringLiteral,
    /// A `YYYY-MM-DD` date.
    DateLiteral,
    /// A `#tag`, including the `#`.
    TagLiteral,
    /// A clause keyword.
    Keyword(Keyword),
    /// End of the token stream.
    EndOfInput,
}

/// Dependency relation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    DependsOn,
    Blocks,
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    Not,
}

/// Clause keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Sort,
    Group,
    By,
    Asc,
    Desc,
}

/// Two-word operators, matched before single words.
const MULTI_WORD_OPERATORS: &[(&str, TokenKind)] = &[
    ("is not", TokenKind::Operator(Operator::IsNot)),
    ("not includes", TokenKind::Operator(Operator::NotIncludes)),
    ("not matches", TokenKind::Operator(Operator::NotMatches)),
    ("depends on", TokenKind::Relation(Relation::DependsOn)),
];

/// Lexer for tokenizing query expressions.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input string.
    position: usize,
    /// Characters skipped during tokenization.
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Consumes characters while `accept` holds and returns them.
    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if accept(c) {
                self.next_char();
            } else {
                break;
            }
        }
        let input = self.input;
        &input[start..self.position]
    }

    /// Reads a quoted string. An unterminated string runs to end of input.
    ///
    /// A run of backslashes right before the quote character collapses in
    /// pairs, and an odd one left over escapes the quote. Backslashes
    /// anywhere else are kept verbatim.
    fn read_quoted_string(&mut self, quote_char: char) -> String {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == quote_char {
                break;
            }
            if c != '\\' {
                result.push(c);
                continue;
            }

            let mut run = 1;
            while self.peek() == Some('\\') {
                self.next_char();
                run += 1;
            }
            if self.peek() != Some(quote_char) {
                result.push_str(&"\\".repeat(run));
                continue;
            }

            result.push_str(&"\\".repeat(run / 2));
            if run % 2 == 1 {
                self.next_char();
                result.push(quote_char);
            }
        }
        result
    }

    /// Returns the word following the current position without consuming it.
    fn peek_next_word(&self) -> Option<(&'a str, usize)> {
        let input = self.input;
        let rest = &input[self.position..];
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() {
            // No separating whitespace.
            return None;
        }
        let start = self.position + (rest.len() - trimmed.len());
        let len = trimmed
            .find(|c: char| !is_word_char(c))
            .unwrap_or(trimmed.len());
        (len > 0).then(|| (&input[start..start + len], start + len))
    }

    /// Reads a word, consuming a second word too when the pair is an operator.
    fn read_word(&mut self, start: usize) -> Token {
        let word = self.read_while(is_word_char);

        if let Some((next, end)) = self.peek_next_word() {
            let pair = format!("{} {}", word.to_lowercase(), next.to_lowercase());
            if let Some((_, kind)) = MULTI_WORD_OPERATORS.iter().find(|(text, _)| *text == pair) {
                self.position = end;
                return Token::new(*kind, &self.input[start..end], start);
            }
        }

        Token::new(classify_word(word), word, start)
    }

    /// Reads a number-led word; `YYYY-MM-DD` becomes a date literal.
    fn read_number(&mut self, start: usize) -> Token {
        let text = self.read_while(|c| c.is_ascii_digit() || c == '-');
        let kind = if is_iso_date(text) {
            TokenKind::DateLiteral
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, text, start)
    }

    /// Returns the next token, or None once input is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();

            let c = self.peek()?;
            let token_start = self.position;

            match c {
                '(' => {
                    self.next_char();
                    return Some(Token::new(TokenKind::LeftParen, "(", token_start));
                }
                ')' => {
                    self.next_char();
                    return Some(Token::new(TokenKind::RightParen, ")", token_start));
                }
                '#' => {
                    self.next_char();
                    let name = self.read_while(is_tag_char);
                    if !name.is_empty() {
                        let text = &self.input[token_start..self.position];
                        return Some(Token::new(TokenKind::TagLiteral, text, token_start));
                    }
                    self.skip_char('#', token_start);
                }
                ',' => {
                    // Separator between sort keys.
                    self.next_char();
                }
                '"' | '\'' => {
                    let text = self.read_quoted_string(c);
                    return Some(Token::new(TokenKind::StringLiteral, text, token_start));
                }
                _ if c.is_ascii_alphabetic() => return Some(self.read_word(token_start)),
                _ if c.is_ascii_digit() => return Some(self.read_number(token_start)),
                _ => {
                    self.next_char();
                    self.skip_char(c, token_start);
                }
            }
        }
    }

    /// Records a skipped character.
    fn skip_char(&mut self, character: char, position: usize) {
        trace!(%character, position, "skipping unexpected character");
        self.errors.push(LexerError {
            character,
            position,
        });
    }

    /// Collects all tokens and any skipped characters.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::EndOfInput, "", self.input.len()));
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }

    /// Collects all tokens, dropping lexer diagnostics.
    pub fn tokenize(self) -> Vec<Token> {
        self.tokenize_with_errors().tokens
    }
}

/// Tokenizes a query string. Never fails.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '/' | '-')
}

/// Classifies a single word: connective, keyword, operator, then identifier.
fn classify_word(word: &str) -> TokenKind {
    match word.to_lowercase().as_str() {
        "and" => TokenKind::Connective(Connective::And),
        "or" => TokenKind::Connective(Connective::Or),
        "not" => TokenKind::Connective(Connective::Not),
        "sort" => TokenKind::Keyword(Keyword::Sort),
        "group" => TokenKind::Keyword(Keyword::Group),
        "by" => TokenKind::Keyword(Keyword::By),
        "asc" => TokenKind::Keyword(Keyword::Asc),
        "desc" => TokenKind::Keyword(Keyword::Desc),
        "is" => TokenKind::Operator(Operator::Is),
        "includes" => TokenKind::Operator(Operator::Includes),
        "before" => TokenKind::Operator(Operator::Before),
        "after" => TokenKind::Operator(Operator::After),
        "matches" => TokenKind::Operator(Operator::Matches),
        "blocks" => TokenKind::Relation(Relation::Blocks),
        _ => TokenKind::Identifier,
    }
}

/// Checks the exact `YYYY-MM-DD` shape.
pub(crate) fn is_iso_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
