//! Stage validators — pure predicates and parsers for one user message each.

use once_cell::sync::Lazy;
use regex::Regex;

/// Any of these, anywhere in a message (case-insensitive), ends the session.
pub const EXIT_KEYWORDS: &[&str] = &[
    "exit",
    "quit",
    "bye",
    "goodbye",
    "stop",
    "end",
    "cancel",
    "terminate",
    "finish",
];

const AFFIRMATIVE: &[&str] = &["yes", "y", "correct"];
const NEGATIVE: &[&str] = &["no", "n", "incorrect"];

const MIN_PHONE_DIGITS: usize = 10;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("email pattern is valid"));

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d*\.?\d+").expect("number pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    Unclear,
}

/// Substring match, so "frontend" counts as "end".
pub fn contains_exit_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    EXIT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// First whitespace-delimited token, used to address the candidate.
pub fn first_name(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or(text)
}

/// Single `@`, and a dot somewhere in the domain part.
pub fn is_valid_email(text: &str) -> bool {
    EMAIL_RE.is_match(text)
}

/// At least ten digits once everything else is stripped.
pub fn is_valid_phone(text: &str) -> bool {
    text.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
}

/// Years of experience: the first integer or decimal number in free text.
pub fn parse_experience(text: &str) -> Option<f64> {
    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Comma-separated technologies, trimmed, blanks dropped. `None` when nothing is left.
pub fn parse_tech_stack(text: &str) -> Option<Vec<String>> {
    let techs: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if techs.is_empty() {
        None
    } else {
        Some(techs)
    }
}

pub fn parse_confirmation(text: &str) -> Confirmation {
    let lower = text.trim().to_lowercase();
    if AFFIRMATIVE.contains(&lower.as_str()) {
        Confirmation::Yes
    } else if NEGATIVE.contains(&lower.as_str()) {
        Confirmation::No
    } else {
        Confirmation::Unclear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_accepts_simple_address() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("jane.doe@example.com"));
    }

    #[test]
    fn test_email_rejects_missing_tld() {
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a.b@c"));
    }

    #[test]
    fn test_email_rejects_empty_and_double_at() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn test_phone_with_separators_accepted() {
        assert!(is_valid_phone("123-456-7890"));
        assert!(is_valid_phone("+1 (555) 010 9999"));
    }

    #[test]
    fn test_phone_too_short_rejected() {
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_experience_from_free_text() {
        assert_eq!(parse_experience("about 3 years"), Some(3.0));
        assert_eq!(parse_experience("2.5"), Some(2.5));
        assert_eq!(parse_experience("4 years, 6 months"), Some(4.0));
        assert_eq!(parse_experience(".5 years"), Some(0.5));
        assert_eq!(parse_experience("about .5 years"), Some(0.5));
    }

    #[test]
    fn test_experience_without_number() {
        assert_eq!(parse_experience("a few years"), None);
        assert_eq!(parse_experience("..."), None);
    }

    #[test]
    fn test_tech_stack_split_and_trimmed() {
        assert_eq!(
            parse_tech_stack(" Go,  Rust ,,Python "),
            Some(vec!["Go".to_string(), "Rust".to_string(), "Python".to_string()])
        );
    }

    #[test]
    fn test_tech_stack_keeps_duplicates() {
        assert_eq!(
            parse_tech_stack("Go, Go"),
            Some(vec!["Go".to_string(), "Go".to_string()])
        );
    }

    #[test]
    fn test_tech_stack_empty_rejected() {
        assert_eq!(parse_tech_stack(" , ,"), None);
    }

    #[test]
    fn test_confirmation_sets() {
        assert_eq!(parse_confirmation("YES"), Confirmation::Yes);
        assert_eq!(parse_confirmation("y"), Confirmation::Yes);
        assert_eq!(parse_confirmation("Correct"), Confirmation::Yes);
        assert_eq!(parse_confirmation("no"), Confirmation::No);
        assert_eq!(parse_confirmation("Incorrect"), Confirmation::No);
        assert_eq!(parse_confirmation("maybe"), Confirmation::Unclear);
    }

    #[test]
    fn test_exit_keyword_substring_case_insensitive() {
        assert!(contains_exit_keyword("I want to QUIT now"));
        assert!(contains_exit_keyword("Goodbye"));
        assert!(contains_exit_keyword("frontend"));
        assert!(!contains_exit_keyword("Rust, Go"));
    }

    #[test]
    fn test_first_name() {
        assert_eq!(first_name("Ada Lovelace"), "Ada");
        assert_eq!(first_name("Ada"), "Ada");
    }
}
