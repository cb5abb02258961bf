//! Abstract Syntax Tree (AST) for query expressions.

use std::fmt;

use serde::Serialize;

/// A parsed filter expression.
///
/// Each node exclusively owns its children. The parser only ever hands out
/// fully built nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryNode {
    /// `field operator value`.
    Comparison {
        field: String,
        operator: Operator,
        value: String,
    },

    /// Binary AND / OR.
    Logical {
        op: LogicalOp,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },

    /// Negation.
    Not { operand: Box<QueryNode> },

    /// A predicate answered by the dependency graph instead of a field.
    Dependency { check: DependencyCheck },
}

impl QueryNode {
    /// Creates a comparison node.
    pub fn comparison(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        QueryNode::Comparison {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates an AND node from two nodes.
    ///
    /// # Example
    ///
    /// ```
    /// use taskql::query::{Operator, QueryNode};
    ///
    /// let node = QueryNode::and(
    ///     QueryNode::comparison("status", Operator::Is, "todo"),
    ///     QueryNode::comparison("priority", Operator::Is, "high"),
    /// );
    /// assert!(matches!(node, QueryNode::Logical { .. }));
    /// ```
    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates an OR node from two nodes.
    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a NOT node.
    pub fn negate(operand: QueryNode) -> Self {
        QueryNode::Not {
            operand: Box::new(operand),
        }
    }

    /// Creates a dependency shortcut node.
    pub fn dependency(check: DependencyCheck) -> Self {
        QueryNode::Dependency { check }
    }

    /// Calls `visit` for every comparison in the tree, left to right.
    pub fn for_each_comparison<'a>(&'a self, visit: &mut impl FnMut(&'a str, Operator, &'a str)) {
        match self {
            QueryNode::Comparison {
                field,
                operator,
                value,
            } => visit(field, *operator, value),
            QueryNode::Logical { left, right, .. } => {
                left.for_each_comparison(visit);
                right.for_each_comparison(visit);
            }
            QueryNode::Not { operand } => operand.for_each_comparison(visit),
            QueryNode::Dependency { .. } => {}
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Comparison {
                field,
                operator,
                value,
            } => write!(f, "{field} {operator} {}", render_value(value)),
            QueryNode::Logical { op, left, right } => write!(f, "({left} {op} {right})"),
            QueryNode::Not { operand } => write!(f, "NOT {operand}"),
            QueryNode::Dependency { check } => write!(f, "{check}"),
        }
    }
}

/// Binary logical connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("AND"),
            LogicalOp::Or => f.write_str("OR"),
        }
    }
}

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Is,
    IsNot,
    Includes,
    NotIncludes,
    Before,
    After,
    Matches,
    NotMatches,
}

impl Operator {
    /// Canonical query text for the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Includes => "includes",
            Operator::NotIncludes => "not includes",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::Matches => "matches",
            Operator::NotMatches => "not matches",
        }
    }

    /// Returns the positive operator and whether this one negates it.
    pub fn split_negation(&self) -> (Operator, bool) {
        match self {
            Operator::IsNot => (Operator::Is, true),
            Operator::NotIncludes => (Operator::Includes, true),
            Operator::NotMatches => (Operator::Matches, true),
            other => (*other, false),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicates answered by the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum DependencyCheck {
    /// `is blocked`
    Blocked,
    /// `is not blocked`
    NotBlocked,
    /// `is blocking`
    Blocking,
    /// `depends on X`
    DependsOn(String),
    /// `blocks X`
    Blocks(String),
}

impl fmt::Display for DependencyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyCheck::Blocked => f.write_str("is blocked"),
            DependencyCheck::NotBlocked => f.write_str("is not blocked"),
            DependencyCheck::Blocking => f.write_str("is blocking"),
            DependencyCheck::DependsOn(target) => write!(f, "depends on {}", render_value(target)),
            DependencyCheck::Blocks(target) => write!(f, "blocks {}", render_value(target)),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// One key of a `sort by` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// The field of a `group by` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupKey {
    pub field: String,
}

impl GroupKey {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Result of parsing a query.
///
/// No filter matches every record, an empty sort keeps input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupKey>,
}

impl ParsedQuery {
    /// Returns true if the query has no filter, sort or group.
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.sort.is_empty() && self.group.is_none()
    }
}

impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(filter) = &self.filter {
            parts.push(filter.to_string());
        }
        if !self.sort.is_empty() {
            let keys: Vec<String> = self
                .sort
                .iter()
                .map(|key| format!("{} {}", key.field, key.direction))
                .collect();
            parts.push(format!("sort by {}", keys.join(", ")));
        }
        if let Some(group) = &self.group {
            parts.push(format!("group by {}", group.field));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Words the lexer would not read back as a plain value.
const RESERVED_WORDS: &[&str] = &[
    "and", "or", "not", "sort", "group", "by", "asc", "desc", "is", "includes", "before", "after",
    "matches", "blocks",
];

/// Renders a value so that it lexes back to the same text.
fn render_value(value: &str) -> String {
    let mut chars = value.chars();
    let bare = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
                && !RESERVED_WORDS.contains(&value.to_lowercase().as_str())
        }
        Some(first) if first.is_ascii_digit() => value.chars().all(|c| c.is_ascii_digit() || c == '-'),
        Some('#') => {
            value.len() > 1
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '/' | '-'))
        }
        _ => false,
    };

    if bare {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in value.chars() {
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        let escapes = if c == '"' { backslashes * 2 + 1 } else { backslashes };
        quoted.push_str(&"\\".repeat(escapes));
        quoted.push(c);
        backslashes = 0;
    }
    // Backslashes before the closing quote are doubled
    quoted.push_str(&"\\".repeat(backslashes * 2));
    quoted.push('"');
    quoted
}
