use std::collections::HashSet;

use crate::models::ResumeDocument;

/// Section names that never belong on a tailored resume.
const DEFAULT_BLACKLIST: &[&str] = &[
    "languages",
    "languages spoken",
    "language proficiency",
    "language skills",
    "hobbies",
    "interests",
    "personal interests",
    "references",
    "references available",
    "references available upon request",
];

/// Lowercase, `&` read as "and", every run of whitespace, punctuation or
/// underscores collapsed to one space, trimmed.
///
/// `"Languages_Spoken"`, `"languages-spoken"` and `" Languages  Spoken "` all
/// canonicalize to `"languages spoken"`.
pub fn canonical_name(name: &str) -> String {
    name.replace('&', " and ")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlacklist {
    names: HashSet<String>,
}

impl SectionBlacklist {
    pub fn new<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|n| canonical_name(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Exact canonical match, or a compound name ("Hobbies & Interests")
    /// whose every part is blacklisted.
    pub fn is_banned(&self, name: &str) -> bool {
        let canonical = canonical_name(name);
        if canonical.is_empty() {
            return false;
        }
        if self.names.contains(&canonical) {
            return true;
        }
        let parts: Vec<&str> = canonical.split(" and ").collect();
        parts.len() > 1 && parts.iter().all(|p| self.names.contains(*p))
    }
}

impl Default for SectionBlacklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST.iter().copied())
    }
}

/// Strips blacklisted sections. Total: never fails, never touches anything else.
#[derive(Debug, Clone, Default)]
pub struct SectionFilter {
    blacklist: SectionBlacklist,
}

impl SectionFilter {
    pub fn new(blacklist: SectionBlacklist) -> Self {
        Self { blacklist }
    }

    pub fn blacklist(&self) -> &SectionBlacklist {
        &self.blacklist
    }

    /// Returns the filtered document and the field paths that were removed.
    pub fn filter(&self, mut doc: ResumeDocument) -> (ResumeDocument, Vec<String>) {
        let removed = self.filter_in_place(&mut doc);
        (doc, removed)
    }

    pub(crate) fn filter_in_place(&self, doc: &mut ResumeDocument) -> Vec<String> {
        let mut removed = Vec::new();

        if !doc.additional.languages.is_empty() && self.blacklist.is_banned("languages") {
            doc.additional.languages.clear();
            removed.push("additional.languages".to_string());
        }

        doc.custom_sections.retain(|key, _| {
            if self.blacklist.is_banned(key) {
                removed.push(format!("customSections.{key}"));
                false
            } else {
                true
            }
        });

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomSection;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CustomSection {
        CustomSection::Text {
            text: s.to_string(),
        }
    }

    #[test]
    fn test_canonical_name_collapses_separators() {
        assert_eq!(canonical_name("Languages_Spoken"), "languages spoken");
        assert_eq!(canonical_name("  languages--spoken! "), "languages spoken");
        assert_eq!(canonical_name("Hobbies & Interests"), "hobbies and interests");
        assert_eq!(canonical_name("___"), "");
    }

    #[test]
    fn test_blacklist_matches_canonical_names() {
        let bl = SectionBlacklist::default();
        assert!(bl.is_banned("Languages Spoken"));
        assert!(bl.is_banned("hobbies"));
        assert!(bl.is_banned("References available upon request"));
        assert!(bl.is_banned("references_available_upon_request"));
        assert!(bl.is_banned("Hobbies & Interests"));
    }

    #[test]
    fn test_blacklist_does_not_match_partial_names() {
        let bl = SectionBlacklist::default();
        assert!(!bl.is_banned("Programming Languages"));
        assert!(!bl.is_banned("Research Interests Statement"));
        assert!(!bl.is_banned("Skills and Languages"));
        assert!(!bl.is_banned(""));
    }

    #[test]
    fn test_filter_removes_blacklisted_and_nothing_else() {
        let mut doc = ResumeDocument::default();
        doc.additional.languages = vec!["French (Fluent)".into()];
        doc.additional.technical_skills = vec!["Rust".into()];
        doc.custom_sections.insert("Languages Spoken".into(), text("French"));
        doc.custom_sections.insert("hobbies".into(), text("Climbing"));
        doc.custom_sections
            .insert("References available upon request".into(), text(""));
        doc.custom_sections.insert("publications".into(), text("Paper"));
        doc.custom_sections.insert("volunteer_work".into(), text("Mentor"));

        let (filtered, removed) = SectionFilter::default().filter(doc);

        assert!(filtered.additional.languages.is_empty());
        assert_eq!(filtered.additional.technical_skills, vec!["Rust"]);
        assert_eq!(
            filtered.custom_sections.keys().collect::<Vec<_>>(),
            vec!["publications", "volunteer_work"]
        );
        assert_eq!(removed.len(), 4);
        assert!(removed.contains(&"additional.languages".to_string()));
        assert!(removed.contains(&"customSections.hobbies".to_string()));
    }

    #[test]
    fn test_filter_is_idempotent_on_clean_document() {
        let mut doc = ResumeDocument::default();
        doc.custom_sections.insert("awards".into(), text("Best paper"));
        let (once, _) = SectionFilter::default().filter(doc.clone());
        let (twice, removed) = SectionFilter::default().filter(once.clone());
        assert_eq!(once, doc);
        assert_eq!(twice, once);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_custom_blacklist() {
        let filter = SectionFilter::new(SectionBlacklist::new(["Objective"]));
        let mut doc = ResumeDocument::default();
        doc.additional.languages = vec!["German".into()];
        doc.custom_sections.insert("objective".into(), text("Get hired"));
        let (filtered, _) = filter.filter(doc);
        assert!(filtered.custom_sections.is_empty());
        // "languages" is not in this blacklist.
        assert_eq!(filtered.additional.languages, vec!["German"]);
    }
}
