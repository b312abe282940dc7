//! One-line task entry: "Buy milk tomorrow" becomes a titled task due tomorrow.

use chrono::{DateTime, Duration, Utc};
use regex_lite::Regex;

/// Result of parsing a quick-add line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAdd {
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
}

/// Pull a relative due date keyword out of `input`.
///
/// `tomorrow` wins over `today`; only the first occurrence of the keyword is
/// removed, matched case-insensitively anywhere in the text.
pub fn parse_quick_add(input: &str, now: DateTime<Utc>) -> QuickAdd {
    let (text, due_date) = if let Some(rest) = strip_keyword(input, "tomorrow") {
        (rest, Some(now + Duration::days(1)))
    } else if let Some(rest) = strip_keyword(input, "today") {
        (rest, Some(now))
    } else {
        (input.to_string(), None)
    };

    let title = text.split_whitespace().collect::<Vec<_>>().join(" ");

    QuickAdd { title, due_date }
}

/// Remove the first case-insensitive occurrence of `keyword`, if any.
fn strip_keyword(input: &str, keyword: &str) -> Option<String> {
    let re = Regex::new(&format!("(?i){}", regex_lite::escape(keyword))).ok()?;
    re.is_match(input)
        .then(|| re.replacen(input, 1, "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_tomorrow() {
        let parsed = parse_quick_add("Buy milk tomorrow", now());
        assert_eq!(parsed.title, "Buy milk");
        assert_eq!(parsed.due_date, Some(now() + Duration::days(1)));
    }

    #[test]
    fn test_today_case_insensitive() {
        let parsed = parse_quick_add("TODAY call   the bank", now());
        assert_eq!(parsed.title, "call the bank");
        assert_eq!(parsed.due_date, Some(now()));
    }

    #[test]
    fn test_tomorrow_wins_over_today() {
        let parsed = parse_quick_add("today plan tomorrow", now());
        assert_eq!(parsed.title, "today plan");
        assert_eq!(parsed.due_date, Some(now() + Duration::days(1)));
    }

    #[test]
    fn test_only_first_occurrence_removed() {
        let parsed = parse_quick_add("tomorrow prep tomorrow standup", now());
        assert_eq!(parsed.title, "prep tomorrow standup");
    }

    #[test]
    fn test_no_keyword() {
        let parsed = parse_quick_add("  Water plants ", now());
        assert_eq!(parsed.title, "Water plants");
        assert!(parsed.due_date.is_none());
    }

    #[test]
    fn test_substring_match() {
        // Matching is substring-based, as in "todays"
        let parsed = parse_quick_add("Review todays notes", now());
        assert_eq!(parsed.title, "Review s notes");
        assert_eq!(parsed.due_date, Some(now()));
    }
}
