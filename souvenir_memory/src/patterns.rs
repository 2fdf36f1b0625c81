//! Pattern library for personal-fact extraction.
//!
//! Patterns are plain data so they can be loaded from configuration. Within a
//! category the rules are tried in declaration order and the first match wins.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Letters accepted inside a French word, accented forms included.
const LETTERS: &str = "a-zéèêëàâäôöùûüÿçÉÈÊËÀÂÄÔÖÙÛÜŸÇ";

/// Error type for pattern building.
#[derive(Debug)]
pub enum BuildError {
    /// The regex pattern is invalid.
    Regex(String),

    /// The pattern has no capture group to take the value from.
    NoCaptureGroup(String),

    /// The category is empty.
    Category,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regex(e) => write!(f, "invalid regex: {e}"),
            Self::NoCaptureGroup(p) => write!(f, "pattern has no capture group: {p}"),
            Self::Category => write!(f, "empty category"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<regex::Error> for BuildError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

/// Ordered regex alternatives for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternRule {
    /// Fact category the first capture group is stored under.
    pub category: String,

    /// Alternatives, tried in order.
    pub patterns: Vec<String>,
}

impl PatternRule {
    #[must_use]
    pub fn new(category: &str, patterns: Vec<String>) -> Self {
        Self {
            category: category.to_string(),
            patterns,
        }
    }

    /// Compile every alternative of this rule.
    ///
    /// # Errors
    /// Returns the first alternative that is not a valid regex or that has
    /// no capture group.
    pub fn build(&self) -> Result<Vec<Regex>, BuildError> {
        if self.category.trim().is_empty() {
            return Err(BuildError::Category);
        }
        self.patterns.iter().map(|p| compile(p)).collect()
    }
}

/// Compile one pattern, requiring a value capture group.
pub(crate) fn compile(pattern: &str) -> Result<Regex, BuildError> {
    let re = Regex::new(pattern)?;
    if re.captures_len() < 2 {
        return Err(BuildError::NoCaptureGroup(pattern.to_string()));
    }
    Ok(re)
}

/// The full rule set used by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternLibrary {
    /// Name-introduction phrasings matched against the original-case text.
    pub name_rules: Vec<String>,

    /// Category rules matched against the lower-cased text.
    pub rules: Vec<PatternRule>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        default_library()
    }
}

/// Default French library.
#[must_use]
pub fn default_library() -> PatternLibrary {
    PatternLibrary {
        name_rules: name_introduction_patterns(),
        rules: vec![
            PatternRule::new("name", name_patterns()),
            PatternRule::new("age", age_patterns()),
            PatternRule::new("job", job_patterns()),
            PatternRule::new("location", location_patterns()),
            PatternRule::new("preference", preference_patterns()),
            PatternRule::new("dislike", dislike_patterns()),
        ],
    }
}

/// One or two capitalized words, joined by spaces or a hyphen.
fn capitalized_name() -> String {
    format!("([A-Z][{LETTERS}]+(?:[-\\s]+[A-Z][{LETTERS}]+)?)")
}

/// High-precision phrasings, case-sensitive.
fn name_introduction_patterns() -> Vec<String> {
    let name = capitalized_name();
    ["Je m'appelle", "Mon nom est", "Mon prénom est", "Appelle-moi"]
        .iter()
        .map(|intro| format!("{intro} {name}"))
        .collect()
}

/// Generic name phrasings. They run on lower-cased text, where the leading
/// capital can no longer match.
fn name_patterns() -> Vec<String> {
    vec![
        format!(
            r"(?:je m'appelle|mon nom est|c'est|moi c'est)\s+([A-Z][{LETTERS}]+(?:\s+[A-Z][{LETTERS}]+)?)"
        ),
        format!(r"(?:mon prénom est)\s+([A-Z][{LETTERS}]+)"),
    ]
}

fn age_patterns() -> Vec<String> {
    vec![r"(?:j'ai|mon âge est)\s+(\d+)\s+ans".to_string()]
}

fn job_patterns() -> Vec<String> {
    vec![format!(
        r"(?:je suis|je travaille comme|mon métier est)\s+([{LETTERS}]+(?:\s+[{LETTERS}]+){{0,3}})"
    )]
}

fn location_patterns() -> Vec<String> {
    vec![format!(
        r"(?:j'habite à|je vis à|je suis de)\s+([{LETTERS}]+(?:\s+[{LETTERS}]+)?)"
    )]
}

fn preference_patterns() -> Vec<String> {
    vec![format!(
        r"(?:j'aime|je préfère)\s+([{LETTERS}]+(?:\s+[{LETTERS}]+){{0,5}})"
    )]
}

fn dislike_patterns() -> Vec<String> {
    vec![format!(
        r"(?:je n'aime pas|je déteste)\s+([{LETTERS}]+(?:\s+[{LETTERS}]+){{0,5}})"
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_library_compiles() {
        let library = default_library();
        for rule in &library.rules {
            assert!(rule.build().is_ok(), "rule {} should compile", rule.category);
        }
        for pattern in &library.name_rules {
            assert!(compile(pattern).is_ok(), "{pattern} should compile");
        }
    }

    #[test]
    fn default_categories_in_declaration_order() {
        let categories: Vec<_> = default_library()
            .rules
            .into_iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(
            categories,
            ["name", "age", "job", "location", "preference", "dislike"]
        );
    }

    #[test]
    fn invalid_regex_is_reported() {
        let rule = PatternRule::new("age", vec!["(unclosed".to_string()]);
        assert!(matches!(rule.build(), Err(BuildError::Regex(_))));
    }

    #[test]
    fn pattern_without_group_is_rejected() {
        let rule = PatternRule::new("age", vec![r"\d+ ans".to_string()]);
        assert!(matches!(rule.build(), Err(BuildError::NoCaptureGroup(_))));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn library_serialization() {
        let library = default_library();
        let json = serde_json::to_string(&library).expect("library should serialize");
        let back: PatternLibrary =
            serde_json::from_str(&json).expect("valid JSON should deserialize");
        assert_eq!(back, library);
    }
}
