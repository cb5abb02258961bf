//! Lookup tables shared by the parser, resolver, evaluator and sorter.
//!
//! A [`Vocabulary`] is a plain value handed to each stage, so queries built
//! with different tables can run side by side.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Fields backed by [`Task`](crate::Task) struct members.
pub const BUILTIN_FIELDS: &[&str] = &[
    "id",
    "description",
    "status",
    "priority",
    "due",
    "scheduled",
    "start",
    "created",
    "done",
    "tags",
    "path",
    "dependency_id",
    "depends_on",
    "recurrence",
];

const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("tag", "tags"),
    ("due_date", "due"),
    ("text", "description"),
    ("content", "description"),
    ("file", "path"),
    ("filename", "path"),
    ("deps", "depends_on"),
    ("dependencies", "depends_on"),
    ("dependency", "dependency_id"),
    ("dep", "dependency_id"),
    ("recurring", "recurrence"),
    ("repeat", "recurrence"),
    ("completed", "done"),
    ("done_date", "done"),
    ("starts", "start"),
    ("created_date", "created"),
    ("scheduled_date", "scheduled"),
];

/// Highest first. `none` deliberately sits between `medium` and `low`.
const DEFAULT_PRIORITY_RANKS: &[(&str, u8)] = &[
    ("highest", 0),
    ("high", 1),
    ("medium", 2),
    ("none", 3),
    ("low", 4),
    ("lowest", 5),
];

const DEFAULT_DATE_FIELDS: &[&str] = &["due", "scheduled", "start", "created", "done"];

const DEFAULT_STATUS_WORDS: &[&str] = &["todo", "in-progress", "done", "cancelled"];

/// The field that bare status words compare against.
pub const STATUS_FIELD: &str = "status";

/// The field ranked by the priority table.
pub const PRIORITY_FIELD: &str = "priority";

/// Field aliases, priority ranks, date fields and status words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    aliases: HashMap<String, String>,
    priority_ranks: HashMap<String, u8>,
    date_fields: HashSet<String>,
    status_words: HashSet<String>,
    custom_fields: BTreeSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(short, canonical)| (short.to_string(), canonical.to_string()))
                .collect(),
            priority_ranks: DEFAULT_PRIORITY_RANKS
                .iter()
                .map(|(name, rank)| (name.to_string(), *rank))
                .collect(),
            date_fields: DEFAULT_DATE_FIELDS.iter().map(|s| s.to_string()).collect(),
            status_words: DEFAULT_STATUS_WORDS.iter().map(|s| s.to_string()).collect(),
            custom_fields: BTreeSet::new(),
        }
    }
}

impl Vocabulary {
    /// Adds or replaces an alias. The short name is matched case-insensitively.
    pub fn with_alias(mut self, short: impl AsRef<str>, canonical: impl Into<String>) -> Self {
        self.aliases
            .insert(short.as_ref().to_lowercase(), canonical.into());
        self
    }

    /// Declares a custom field so it is not reported as unknown.
    pub fn with_custom_field(mut self, name: impl Into<String>) -> Self {
        self.custom_fields.insert(name.into());
        self
    }

    /// Adds or replaces a priority rank. Lower ranks sort first.
    pub fn with_priority_rank(mut self, name: impl AsRef<str>, rank: u8) -> Self {
        self.priority_ranks
            .insert(name.as_ref().to_lowercase(), rank);
        self
    }

    /// Marks a field as holding dates.
    pub fn with_date_field(mut self, name: impl Into<String>) -> Self {
        self.date_fields.insert(name.into());
        self
    }

    /// Adds a word that may stand alone as `status is <word>`.
    pub fn with_status_word(mut self, word: impl AsRef<str>) -> Self {
        self.status_words.insert(word.as_ref().to_lowercase());
        self
    }

    /// Maps a field name through the alias table.
    ///
    /// Built-in names and aliases are matched case-insensitively; anything
    /// else is returned unchanged for direct property lookup.
    pub fn canonical_field(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        if let Some(canonical) = self.aliases.get(&lower) {
            return canonical.clone();
        }
        if BUILTIN_FIELDS.contains(&lower.as_str()) {
            return lower;
        }
        name.to_string()
    }

    /// Rank of a priority label; unknown labels rank after every known one.
    pub fn priority_rank(&self, label: &str) -> u8 {
        self.priority_ranks
            .get(&label.to_lowercase())
            .copied()
            .unwrap_or(u8::MAX)
    }

    /// Returns true if the canonical field holds dates.
    pub fn is_date_field(&self, canonical: &str) -> bool {
        self.date_fields.contains(canonical)
    }

    /// Returns true if the word can stand alone as a status predicate.
    pub fn is_status_word(&self, word: &str) -> bool {
        self.status_words.contains(&word.to_lowercase())
    }

    /// Returns true if the name resolves to a field this vocabulary knows.
    ///
    /// Dotted paths are always accepted since they address nested properties.
    pub fn is_known_field(&self, name: &str) -> bool {
        if name.contains('.') {
            return true;
        }
        let canonical = self.canonical_field(name);
        BUILTIN_FIELDS.contains(&canonical.as_str())
            || canonical.contains('.')
            || self.custom_fields.contains(&canonical)
            || self.custom_fields.contains(name)
    }

    /// Every name a query may use for a field, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = BUILTIN_FIELDS.iter().map(|s| s.to_string()).collect();
        names.extend(self.aliases.keys().cloned());
        names.extend(self.custom_fields.iter().cloned());
        names.into_iter().collect()
    }

    /// Closest known field name, for "did you mean" hints.
    pub fn suggest_field(&self, name: &str) -> Option<String> {
        let lower = name.to_lowercase();
        self.field_names()
            .into_iter()
            .map(|candidate| {
                let score = strsim::jaro_winkler(&lower, &candidate);
                (candidate, score)
            })
            .filter(|(_, score)| *score >= 0.85)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_field_aliases() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.canonical_field("tag"), "tags");
        assert_eq!(vocab.canonical_field("TAG"), "tags");
        assert_eq!(vocab.canonical_field("Due"), "due");
        assert_eq!(vocab.canonical_field("text"), "description");
        assert_eq!(vocab.canonical_field("Owner"), "Owner");
    }

    #[test]
    fn test_custom_alias_to_dotted_path() {
        let vocab = Vocabulary::default().with_alias("Owner", "meta.owner");
        assert_eq!(vocab.canonical_field("owner"), "meta.owner");
        assert!(vocab.is_known_field("owner"));
    }

    #[test]
    fn test_priority_ranks_place_none_between_medium_and_low() {
        let vocab = Vocabulary::default();
        let medium = vocab.priority_rank("medium");
        let none = vocab.priority_rank("none");
        let low = vocab.priority_rank("low");
        assert!(medium < none && none < low);
        assert!(vocab.priority_rank("highest") < vocab.priority_rank("high"));
        assert_eq!(vocab.priority_rank("urgent"), u8::MAX);
    }

    #[test]
    fn test_custom_priority_rank() {
        let vocab = Vocabulary::default().with_priority_rank("Urgent", 0);
        assert_eq!(vocab.priority_rank("urgent"), 0);
    }

    #[test]
    fn test_status_words() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_status_word("done"));
        assert!(vocab.is_status_word("DONE"));
        assert!(vocab.is_status_word("in-progress"));
        assert!(!vocab.is_status_word("blocked"));

        let vocab = vocab.with_status_word("Waiting");
        assert!(vocab.is_status_word("waiting"));
    }

    #[test]
    fn test_known_fields() {
        let vocab = Vocabulary::default().with_custom_field("owner");
        assert!(vocab.is_known_field("status"));
        assert!(vocab.is_known_field("tag"));
        assert!(vocab.is_known_field("owner"));
        assert!(vocab.is_known_field("meta.estimate"));
        assert!(!vocab.is_known_field("stauts"));
    }

    #[test]
    fn test_suggest_field() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.suggest_field("stauts").as_deref(), Some("status"));
        assert_eq!(vocab.suggest_field("priorty").as_deref(), Some("priority"));
        assert_eq!(vocab.suggest_field("qqqqqq"), None);
    }

    #[test]
    fn test_date_fields() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_date_field("due"));
        assert!(!vocab.is_date_field("path"));
        assert!(vocab.with_date_field("reviewed").is_date_field("reviewed"));
    }
}
