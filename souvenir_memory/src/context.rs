//! Renders a memory record as a block of instructions for the prompt.

use std::fmt::Write;

use crate::extractor::capitalize;
use crate::record::{Category, MemoryRecord};

const HEADING: &str = "### Informations importantes à retenir sur l'utilisateur:";
const CLOSING: &str = "Tu dois utiliser ces informations pour personnaliser tes réponses, mais sans les répéter explicitement à l'utilisateur.";

/// Empty string when the record holds no facts, so callers can skip it.
///
/// The name comes first, then every other fact in insertion order.
#[must_use]
pub fn format_context(record: &MemoryRecord) -> String {
    if record.memories.is_empty() {
        return String::new();
    }

    let mut lines = vec![HEADING.to_string()];

    if let Some(name) = record.memories.get(Category::Name.as_str()) {
        lines.push(format!(
            "- L'utilisateur s'appelle {}. Utilise son prénom dans tes réponses pour personnaliser la conversation.",
            name.value
        ));
    }

    for (key, fact) in record.memories.iter() {
        let category = Category::from(key);
        if category == Category::Name {
            continue;
        }
        let label = category
            .display_label()
            .map_or_else(|| capitalize(key), str::to_string);
        lines.push(format!("- {label}: {}", fact.value));
    }

    let mut context = lines.join("\n");
    let _ = write!(context, "\n\n{CLOSING}");
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_renders_nothing() {
        assert_eq!(format_context(&MemoryRecord::empty("1")), "");
    }

    #[test]
    fn name_only() {
        let mut record = MemoryRecord::empty("1");
        record.set_fact("name", "Marie");

        let context = format_context(&record);
        assert_eq!(
            context,
            "### Informations importantes à retenir sur l'utilisateur:\n\
             - L'utilisateur s'appelle Marie. Utilise son prénom dans tes réponses pour personnaliser la conversation.\n\n\
             Tu dois utiliser ces informations pour personnaliser tes réponses, mais sans les répéter explicitement à l'utilisateur."
        );
        assert!(!context.contains("Âge"));
    }

    #[test]
    fn name_first_then_insertion_order() {
        let mut record = MemoryRecord::empty("1");
        record.set_fact("location", "lyon");
        record.set_fact("age", "31");
        record.set_fact("name", "Lucie");
        record.set_fact("hobby", "escalade");

        let context = format_context(&record);
        let lines: Vec<&str> = context.lines().collect();
        assert!(lines[1].contains("s'appelle Lucie"));
        assert_eq!(lines[2], "- Lieu de résidence: lyon");
        assert_eq!(lines[3], "- Âge: 31");
        assert_eq!(lines[4], "- Hobby: escalade");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn labels() {
        let mut record = MemoryRecord::empty("1");
        record.set_fact("job", "boulanger");
        record.set_fact("preference", "le jazz");
        record.set_fact("dislike", "la pluie");

        let context = format_context(&record);
        assert!(context.contains("- Profession: boulanger"));
        assert!(context.contains("- Préférence: le jazz"));
        assert!(context.contains("- N'aime pas: la pluie"));
        assert!(!context.contains("s'appelle"));
    }
}
