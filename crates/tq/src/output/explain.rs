//! Explain output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use taskql::query::{ParsedQuery, QueryError, QueryNode, Token, TokenKind};

/// Everything `tq explain` reports about one query.
#[derive(Serialize)]
pub struct ExplainReport<'a> {
    pub input: &'a str,
    pub normalized: String,
    pub query: &'a ParsedQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<TokenOutput<'a>>>,
    pub diagnostics: Vec<String>,
}

/// JSON output for one token.
#[derive(Serialize)]
pub struct TokenOutput<'a> {
    pub kind: String,
    pub text: &'a str,
    pub position: usize,
}

impl<'a> ExplainReport<'a> {
    /// Builds a report. `tokens` is the raw lexer output, if it should be shown.
    pub fn new(
        input: &'a str,
        query: &'a ParsedQuery,
        tokens: Option<&'a [Token]>,
        diagnostics: &[QueryError],
    ) -> Self {
        Self {
            input,
            normalized: query.to_string(),
            query,
            tokens: tokens.map(|tokens| {
                tokens
                    .iter()
                    .filter(|token| token.kind != TokenKind::EndOfInput)
                    .map(|token| TokenOutput {
                        kind: format!("{:?}", token.kind),
                        text: &token.text,
                        position: token.position,
                    })
                    .collect()
            }),
            diagnostics: diagnostics.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Formats an explain report as JSON.
pub fn format_explain_json(report: &ExplainReport<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Formats an explain report for humans.
pub fn format_explain_text(report: &ExplainReport<'_>, use_colors: bool) -> String {
    let label = |text: &str| {
        if use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    let mut output = String::new();
    output.push_str(&format!("{} {}\n", label("Query:"), report.input));
    output.push_str(&format!("{} {}\n", label("Normalized:"), report.normalized));

    output.push_str(&format!("{}\n", label("Filter:")));
    match &report.query.filter {
        Some(node) => render_node(node, 1, &mut output),
        None => output.push_str("  (none, matches everything)\n"),
    }

    if !report.query.sort.is_empty() {
        let keys: Vec<String> = report
            .query
            .sort
            .iter()
            .map(|key| format!("{} {}", key.field, key.direction))
            .collect();
        output.push_str(&format!("{} {}\n", label("Sort:"), keys.join(", ")));
    }

    if let Some(group) = &report.query.group {
        output.push_str(&format!("{} {}\n", label("Group:"), group.field));
    }

    if let Some(tokens) = &report.tokens {
        output.push_str(&format!("{}\n", label("Tokens:")));
        for token in tokens {
            output.push_str(&format!(
                "  {:>4}  {:<24} {:?}\n",
                token.position, token.kind, token.text
            ));
        }
    }

    if !report.diagnostics.is_empty() {
        output.push_str(&format!("{}\n", label("Diagnostics:")));
        for diagnostic in &report.diagnostics {
            if use_colors {
                output.push_str(&format!("  - {}\n", diagnostic.yellow()));
            } else {
                output.push_str(&format!("  - {}\n", diagnostic));
            }
        }
    }

    output
}

/// Renders a filter tree one node per line, children indented.
fn render_node(node: &QueryNode, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        QueryNode::Comparison {
            field,
            operator,
            value,
        } => output.push_str(&format!("{indent}{field} {operator} {value:?}\n")),
        QueryNode::Logical { op, left, right } => {
            output.push_str(&format!("{indent}{op}\n"));
            render_node(left, depth + 1, output);
            render_node(right, depth + 1, output);
        }
        QueryNode::Not { operand } => {
            output.push_str(&format!("{indent}NOT\n"));
            render_node(operand, depth + 1, output);
        }
        QueryNode::Dependency { check } => output.push_str(&format!("{indent}{check}\n")),
    }
}
