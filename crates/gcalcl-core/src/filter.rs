//! Title matching for events and calendars.
//!
//! With regex matching enabled a pattern matches when it matches at the
//! start of the title; otherwise the title must be equal to the pattern.

use regex::Regex;

use crate::error::{CoreError, CoreResult};

/// Matches titles against a user-supplied pattern.
#[derive(Debug, Clone)]
pub enum TitleMatcher {
    /// Every title matches.
    Any,
    /// Title must equal the string.
    Exact(String),
    /// Title must match the regex, anchored at the start.
    Pattern(Regex),
}

impl TitleMatcher {
    /// Builds a matcher for `pattern` under the given policy.
    ///
    /// `None` or an empty pattern matches every title.
    pub fn new(pattern: Option<&str>, use_regex: bool) -> CoreResult<Self> {
        let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
            return Ok(Self::Any);
        };

        if !use_regex {
            return Ok(Self::Exact(pattern.to_string()));
        }

        Regex::new(&format!("^(?:{pattern})"))
            .map(Self::Pattern)
            .map_err(|source| CoreError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Returns true if `title` matches.
    pub fn is_match(&self, title: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => title == expected,
            Self::Pattern(re) => re.is_match(title),
        }
    }
}

/// Returns a pattern that matches `title` literally under the given policy.
pub fn literal_pattern(title: &str, use_regex: bool) -> String {
    if use_regex {
        format!("{}$", regex::escape(title))
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pattern_matches_everything() {
        let matcher = TitleMatcher::new(None, true).unwrap();
        assert!(matcher.is_match("anything"));
        let matcher = TitleMatcher::new(Some(""), false).unwrap();
        assert!(matcher.is_match(""));
    }

    #[test]
    fn exact_matching() {
        let matcher = TitleMatcher::new(Some("Lunch"), false).unwrap();
        assert!(matcher.is_match("Lunch"));
        assert!(!matcher.is_match("Lunch with Tony"));
        assert!(!matcher.is_match("lunch"));
    }

    #[test]
    fn regex_matches_from_start() {
        let matcher = TitleMatcher::new(Some("Lunch.*"), true).unwrap();
        assert!(matcher.is_match("Lunch with Tony"));
        assert!(!matcher.is_match("Late Lunch"));

        let matcher = TitleMatcher::new(Some("Stand|Sync"), true).unwrap();
        assert!(matcher.is_match("Standup"));
        assert!(matcher.is_match("Sync"));
        assert!(!matcher.is_match("Team Sync"));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = TitleMatcher::new(Some("(unclosed"), true).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn literal_pattern_escapes_regex() {
        let title = "1:1 (weekly) + notes";
        let matcher = TitleMatcher::new(Some(&literal_pattern(title, true)), true).unwrap();
        assert!(matcher.is_match(title));
        assert!(!matcher.is_match("1:1 (weekly) + notes, part 2"));

        assert_eq!(literal_pattern(title, false), title);
    }
}
