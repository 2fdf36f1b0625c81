//! Regex-based personal-fact extractor.
//!
//! The extractor is stateless once built: `extract` is a pure function from a
//! message to at most one value per category.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde::ser::SerializeMap;
use tracing::{info, warn};

use crate::patterns::{PatternLibrary, compile, default_library};

static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(Extractor::with_defaults);

/// Shared extractor built from [`default_library`].
#[must_use]
pub fn default_extractor() -> &'static Extractor {
    &DEFAULT_EXTRACTOR
}

/// Facts extracted from one message, in category declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    facts: Vec<(String, String)>,
}

impl Extraction {
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&str> {
        self.facts
            .iter()
            .find(|(key, _)| key == category)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facts
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Keeps the first value written for a category.
    fn set_once(&mut self, category: &str, value: String) {
        if !self.contains(category) {
            self.facts.push((category.to_string(), value));
        }
    }
}

impl Serialize for Extraction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.facts.len()))?;
        for (category, value) in &self.facts {
            map.serialize_entry(category, value)?;
        }
        map.end()
    }
}

struct CompiledRule {
    category: String,
    patterns: Vec<Regex>,
}

/// Compiled pattern library.
pub struct Extractor {
    name_rules: Vec<Regex>,
    rules: Vec<CompiledRule>,
}

impl Extractor {
    /// Compile a library. A pattern that fails to compile is logged and
    /// skipped so it cannot block the other categories.
    #[must_use]
    pub fn new(library: &PatternLibrary) -> Self {
        let name_rules = library
            .name_rules
            .iter()
            .filter_map(|pattern| match compile(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping name pattern {pattern}: {e}");
                    None
                }
            })
            .collect();

        let rules = library
            .rules
            .iter()
            .map(|rule| CompiledRule {
                category: rule.category.clone(),
                patterns: rule
                    .patterns
                    .iter()
                    .filter_map(|pattern| match compile(pattern) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            warn!("Skipping {} pattern {pattern}: {e}", rule.category);
                            None
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { name_rules, rules }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(&default_library())
    }

    /// Extract personal facts from a user message.
    ///
    /// Names are looked up first on the original text so their casing is
    /// kept; every other category is matched on the lower-cased text.
    #[must_use]
    pub fn extract(&self, text: &str) -> Extraction {
        let mut extraction = Extraction::default();

        if text.trim().is_empty() {
            warn!("Empty text given to the fact extractor");
            return extraction;
        }

        if let Some(name) = first_capture(&self.name_rules, text) {
            extraction.set_once("name", name);
        }

        let normalized = text.to_lowercase();

        for rule in &self.rules {
            if extraction.contains(&rule.category) {
                continue;
            }
            if let Some(value) = first_capture(&rule.patterns, &normalized) {
                let value = if rule.category == "name" {
                    capitalize(&value)
                } else {
                    value
                };
                extraction.set_once(&rule.category, value);
            }
        }

        if !extraction.is_empty() {
            info!("Extracted facts: {:?}", extraction.facts);
        }

        extraction
    }
}

/// Group 1 of the first pattern that matches.
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// First letter upper-cased, the rest lower-cased.
pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternRule;

    #[test]
    fn empty_text_yields_nothing() {
        let extractor = Extractor::with_defaults();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   \n").is_empty());
    }

    #[test]
    fn unrelated_text_yields_nothing() {
        let extractor = Extractor::with_defaults();
        assert!(extractor.extract("Quel temps fait-il demain ?").is_empty());
        assert!(extractor.extract("hello world").is_empty());
    }

    #[test]
    fn full_name_keeps_casing() {
        let extraction = default_extractor().extract("Je m'appelle Marie Dupont");
        assert_eq!(extraction.get("name"), Some("Marie Dupont"));
        assert_eq!(extraction.len(), 1);
    }

    #[test]
    fn hyphenated_name() {
        let extraction = default_extractor().extract("Bonjour ! Appelle-moi Jean-Pierre.");
        assert_eq!(extraction.get("name"), Some("Jean-Pierre"));
    }

    #[test]
    fn lowercase_name_is_not_detected() {
        let extraction = default_extractor().extract("je m'appelle marie");
        assert!(!extraction.contains("name"));
    }

    #[test]
    fn age() {
        let extraction = default_extractor().extract("j'ai 25 ans");
        assert_eq!(extraction.get("age"), Some("25"));
        assert_eq!(extraction.len(), 1);
    }

    #[test]
    fn several_categories_in_one_message() {
        let extraction = default_extractor()
            .extract("Mon prénom est Lucie, j'ai 31 ans et je déteste les épinards");
        assert_eq!(extraction.get("name"), Some("Lucie"));
        assert_eq!(extraction.get("age"), Some("31"));
        assert_eq!(extraction.get("dislike"), Some("les épinards"));
    }

    #[test]
    fn job_and_location_overlap() {
        let extraction = default_extractor().extract("Je suis de Marseille");
        assert_eq!(extraction.get("job"), Some("de marseille"));
        assert_eq!(extraction.get("location"), Some("marseille"));
    }

    #[test]
    fn location_is_stored_lower_case() {
        let extraction = default_extractor().extract("J'habite à Saint Malo depuis peu");
        assert_eq!(extraction.get("location"), Some("saint malo"));
    }

    #[test]
    fn preference_is_lowercased() {
        let extraction = default_extractor().extract("J'aime la Musique Classique");
        assert_eq!(extraction.get("preference"), Some("la musique classique"));
    }

    #[test]
    fn first_pattern_wins_within_category() {
        let library = PatternLibrary {
            name_rules: vec![],
            rules: vec![PatternRule::new(
                "pet",
                vec![r"mon chat (\w+)".to_string(), r"mon (\w+)".to_string()],
            )],
        };
        let extraction = Extractor::new(&library).extract("Mon chat Tigrou dort");
        assert_eq!(extraction.get("pet"), Some("tigrou"));
    }

    #[test]
    fn broken_pattern_does_not_block_others() {
        let library = PatternLibrary {
            name_rules: vec!["(broken".to_string()],
            rules: vec![
                PatternRule::new("age", vec!["(also broken".to_string()]),
                PatternRule::new("city", vec![r"à (\w+)".to_string()]),
            ],
        };
        let extraction = Extractor::new(&library).extract("J'habite à Nantes");
        assert_eq!(extraction.get("city"), Some("nantes"));
        assert_eq!(extraction.len(), 1);
    }

    #[test]
    fn generic_name_rule_capitalizes() {
        let library = PatternLibrary {
            name_rules: vec![],
            rules: vec![PatternRule::new(
                "name",
                vec![r"on m'appelle (\w+)".to_string()],
            )],
        };
        let extraction = Extractor::new(&library).extract("On m'appelle ÉLODIE");
        assert_eq!(extraction.get("name"), Some("Élodie"));
    }

    #[test]
    fn capitalize_handles_empty() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("paul"), "Paul");
    }
}
