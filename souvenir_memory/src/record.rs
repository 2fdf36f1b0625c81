//! Memory record types.
//!
//! A [`MemoryRecord`] is the persisted unit of state: metadata plus an
//! insertion-ordered map of category -> [`Fact`]. Within one record a category
//! is unique and the latest write wins.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Well-known fact categories. Anything else is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Name,
    Age,
    Job,
    Location,
    Preference,
    Dislike,
    Other(String),
}

impl Category {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Job => "job",
            Self::Location => "location",
            Self::Preference => "preference",
            Self::Dislike => "dislike",
            Self::Other(key) => key,
        }
    }

    /// Label used by the context formatter, `None` for free-form keys.
    #[must_use]
    pub const fn display_label(&self) -> Option<&'static str> {
        match self {
            Self::Age => Some("Âge"),
            Self::Job => Some("Profession"),
            Self::Location => Some("Lieu de résidence"),
            Self::Preference => Some("Préférence"),
            Self::Dislike => Some("N'aime pas"),
            Self::Name | Self::Other(_) => None,
        }
    }
}

impl From<&str> for Category {
    fn from(key: &str) -> Self {
        match key {
            "name" => Self::Name,
            "age" => Self::Age,
            "job" => Self::Job,
            "location" => Self::Location,
            "preference" => Self::Preference,
            "dislike" => Self::Dislike,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single remembered datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub value: String,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Fact {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Category -> fact map that keeps insertion order.
///
/// Re-inserting an existing category replaces the fact in place, so the
/// category keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactMap {
    entries: Vec<(String, Fact)>,
}

impl FactMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<&Fact> {
        self.entries
            .iter()
            .find(|(key, _)| key == category)
            .map(|(_, fact)| fact)
    }

    #[must_use]
    pub fn contains_key(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Insert or replace; returns the previous fact for this category.
    pub fn insert(&mut self, category: impl Into<String>, fact: Fact) -> Option<Fact> {
        let category = category.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(key, _)| *key == category) {
            return Some(std::mem::replace(existing, fact));
        }
        self.entries.push((category, fact));
        None
    }

    pub fn remove(&mut self, category: &str) -> Option<Fact> {
        let index = self.entries.iter().position(|(key, _)| key == category)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fact)> {
        self.entries.iter().map(|(key, fact)| (key.as_str(), fact))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl FromIterator<(String, Fact)> for FactMap {
    fn from_iter<I: IntoIterator<Item = (String, Fact)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (category, fact) in iter {
            map.insert(category, fact);
        }
        map
    }
}

impl Serialize for FactMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, fact) in &self.entries {
            map.serialize_entry(category, fact)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FactMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FactMapVisitor;

        impl<'de> Visitor<'de> for FactMapVisitor {
            type Value = FactMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category to fact")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FactMap, A::Error> {
                let mut map = FactMap::new();
                while let Some((category, fact)) = access.next_entry::<String, Fact>()? {
                    map.insert(category, fact);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FactMapVisitor)
    }
}

/// Persisted memory for one conversation (or the global scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub memories: FactMap,
}

impl MemoryRecord {
    #[must_use]
    pub fn empty(conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            title: None,
            created_at: now,
            updated_at: now,
            memories: FactMap::new(),
        }
    }

    /// Set `category` to `value` stamped now.
    pub fn set_fact(&mut self, category: impl Into<String>, value: impl Into<String>) {
        self.memories.insert(category, Fact::new(value));
    }
}

/// ISO-8601 timestamps. Offset-less values written by older versions are
/// read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut map = FactMap::new();
        map.insert("age", Fact::new("25"));
        map.insert("job", Fact::new("boulanger"));
        let previous = map.insert("age", Fact::new("26"));

        assert_eq!(previous.map(|f| f.value), Some("25".to_string()));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["age", "job"]);
        assert_eq!(map.get("age").map(|f| f.value.as_str()), Some("26"));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut map = FactMap::new();
        for key in ["name", "age", "job"] {
            map.insert(key, Fact::new(key));
        }
        assert!(map.remove("age").is_some());
        assert!(map.remove("age").is_none());
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name", "job"]);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn json_object_order_is_preserved() {
        let json = r#"{
            "conversation_id": "42",
            "created_at": "2024-05-01T10:00:00+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00",
            "memories": {
                "location": {"value": "Lyon", "updated_at": "2024-05-01T10:00:00+00:00"},
                "age": {"value": "31", "updated_at": "2024-05-01T10:00:00+00:00"}
            }
        }"#;
        let record: MemoryRecord = serde_json::from_str(json).expect("record should parse");
        assert_eq!(
            record.memories.keys().collect::<Vec<_>>(),
            vec!["location", "age"]
        );

        let written = serde_json::to_string(&record).expect("record should serialize");
        let location = written.find("\"location\"").expect("location present");
        let age = written.find("\"age\"").expect("age present");
        assert!(location < age);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn legacy_naive_timestamps_and_messages_are_accepted() {
        let json = r#"{
            "conversation_id": "legacy",
            "created_at": "2024-03-02T09:15:42.123456",
            "updated_at": "2024-03-02T09:15:42.123456",
            "messages": [{"sender": "user", "text": "salut"}],
            "memories": {"name": {"value": "Marie", "updated_at": "2024-03-02T09:15:42.123456"}}
        }"#;
        let record: MemoryRecord = serde_json::from_str(json).expect("legacy record should parse");
        assert_eq!(record.conversation_id, "legacy");
        assert_eq!(
            record.memories.get("name").map(|f| f.value.as_str()),
            Some("Marie")
        );
        assert!(record.title.is_none());
    }

    #[test]
    fn category_round_trip() {
        assert_eq!(Category::from("dislike"), Category::Dislike);
        assert_eq!(Category::from("hobby"), Category::Other("hobby".to_string()));
        assert_eq!(Category::Job.display_label(), Some("Profession"));
        assert_eq!(Category::from("hobby").display_label(), None);
        assert_eq!(Category::Location.to_string(), "location");
    }
}
