//! Common helper functions for output formatting.

use chrono::{Duration, NaiveDate};
use owo_colors::OwoColorize;
use taskql::{Priority, TaskStatus};

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Formats priority for display.
pub fn format_priority(priority: Priority, use_colors: bool) -> String {
    let label = priority.as_str();

    if use_colors {
        match priority {
            Priority::Highest => label.red().bold().to_string(),
            Priority::High => label.red().to_string(),
            Priority::Medium => label.yellow().to_string(),
            Priority::None => String::new(),
            Priority::Low | Priority::Lowest => label.dimmed().to_string(),
        }
    } else if priority == Priority::None {
        String::new()
    } else {
        label.to_string()
    }
}

/// Formats a status for display.
pub fn format_status(status: TaskStatus, use_colors: bool) -> String {
    let label = status.as_str();

    if use_colors {
        match status {
            TaskStatus::Todo => label.to_string(),
            TaskStatus::InProgress => label.cyan().to_string(),
            TaskStatus::Done => label.green().to_string(),
            TaskStatus::Cancelled => label.dimmed().to_string(),
        }
    } else {
        label.to_string()
    }
}

/// Formats a due date for display relative to `today`.
///
/// Values that do not start with a `YYYY-MM-DD` date are shown as written.
pub fn format_due(due: Option<&str>, today: NaiveDate, use_colors: bool) -> String {
    let Some(date_str) = due else {
        return String::new();
    };

    let Some(date) = date_str
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
    else {
        return date_str.to_string();
    };

    let tomorrow = today + Duration::days(1);
    let yesterday = today - Duration::days(1);

    let display = if date == today {
        "Today".to_string()
    } else if date == tomorrow {
        "Tomorrow".to_string()
    } else if date == yesterday {
        "Yesterday".to_string()
    } else if date < today {
        let days = (today - date).num_days();
        format!("{days} days ago")
    } else {
        date.format("%b %d").to_string()
    };

    if use_colors {
        if date < today {
            display.red().to_string()
        } else if date == today {
            display.yellow().to_string()
        } else {
            display
        }
    } else {
        display
    }
}

/// Formats tags for display.
pub fn format_tags(tags: &[String], max_len: usize) -> String {
    truncate_str(&tags.join(" "), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("this is long", 10), "this is...");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_format_priority_no_colors() {
        assert_eq!(format_priority(Priority::Highest, false), "highest");
        assert_eq!(format_priority(Priority::Low, false), "low");
        assert_eq!(format_priority(Priority::None, false), "");
    }

    #[test]
    fn test_format_status_no_colors() {
        assert_eq!(format_status(TaskStatus::InProgress, false), "in-progress");
        assert_eq!(format_status(TaskStatus::Done, false), "done");
    }

    #[test]
    fn test_format_due_relative() {
        assert_eq!(format_due(None, today(), false), "");
        assert_eq!(format_due(Some("2025-01-15"), today(), false), "Today");
        assert_eq!(format_due(Some("2025-01-16"), today(), false), "Tomorrow");
        assert_eq!(format_due(Some("2025-01-14"), today(), false), "Yesterday");
        assert_eq!(format_due(Some("2025-01-10"), today(), false), "5 days ago");
        assert_eq!(format_due(Some("2025-02-03"), today(), false), "Feb 03");
    }

    #[test]
    fn test_format_due_with_time_and_garbage() {
        assert_eq!(
            format_due(Some("2025-01-15T09:30:00"), today(), false),
            "Today"
        );
        assert_eq!(format_due(Some("someday"), today(), false), "someday");
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&[], 15), "");
        assert_eq!(
            format_tags(&["#a".to_string(), "#b".to_string()], 15),
            "#a #b"
        );
    }
}
