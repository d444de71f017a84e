//! Phrase sanitizer: strips AI-sounding phrasing from every free-text field.
//!
//! # Matching rules
//! - Case-insensitive, whole-word / whole-phrase: `robust` never matches inside `robustness`
//! - Longer phrases win: `paradigm shift` is tried before `paradigm`
//! - The em dash and `--` / `---` always become `", "`, however they are spaced
//! - Empty replacements are cleaned up: doubled spaces, orphaned commas and
//!   spaces before punctuation are collapsed. Punctuation the writer put at
//!   the start or end of a line is kept unless a deletion left it there
//!
//! Sanitizing is deterministic and idempotent: `sanitize(sanitize(x)) == sanitize(x)`.

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::models::ResumeDocument;

/// Stands in for a deleted phrase until the cleanup pass has run.
const DELETED: &str = "\u{1F}";

/// Default table: phrase → plainer replacement (empty means "delete").
const DEFAULT_PHRASES: &[(&str, &str)] = &[
    // Overused action verbs
    ("spearheaded", "led"),
    ("orchestrated", "coordinated"),
    ("championed", "advocated for"),
    ("synergized", "collaborated"),
    ("leveraged", "used"),
    ("revolutionized", "transformed"),
    ("pioneered", "introduced"),
    ("catalyzed", "initiated"),
    ("operationalized", "implemented"),
    ("architected", "designed"),
    ("envisioned", "planned"),
    ("effectuated", "completed"),
    ("endeavored", "worked"),
    ("facilitated", "helped"),
    ("utilized", "used"),
    // Buzzwords
    ("synergy", "collaboration"),
    ("synergies", "collaborations"),
    ("paradigm", "approach"),
    ("paradigm shift", "change"),
    ("best-in-class", "top-performing"),
    ("world-class", "high-quality"),
    ("cutting-edge", "modern"),
    ("bleeding-edge", "modern"),
    ("game-changer", "innovation"),
    ("game-changing", "innovative"),
    ("disruptive", "innovative"),
    ("disruptor", "innovator"),
    ("holistic", "comprehensive"),
    ("robust", "strong"),
    ("scalable", "expandable"),
    ("actionable", "practical"),
    ("impactful", "effective"),
    ("proactive", "active"),
    ("proactively", "actively"),
    ("stakeholder", "team member"),
    ("deliverables", "outputs"),
    ("bandwidth", "capacity"),
    ("circle back", "follow up"),
    ("deep dive", "analysis"),
    ("move the needle", "make progress"),
    ("low-hanging fruit", "quick wins"),
    ("touch base", "connect"),
    ("value-add", "benefit"),
    // Filler
    ("in order to", "to"),
    ("for the purpose of", "to"),
    ("with a view to", "to"),
    ("at the end of the day", ""),
    ("moving forward", ""),
    ("going forward", ""),
    ("on a daily basis", "daily"),
    ("on a regular basis", "regularly"),
    ("in a timely manner", "promptly"),
    ("at this point in time", "now"),
    ("due to the fact that", "because"),
    ("in the event that", "if"),
    ("in light of the fact that", "since"),
    // Punctuation patterns
    ("\u{2014}", ", "),
    ("---", ", "),
    ("--", ", "),
];

/// Upper bound on sanitize passes when chasing a fixpoint.
const MAX_PASSES: usize = 4;

// ────────────────────────────────────────────────────────────────────────────
// Phrase table
// ────────────────────────────────────────────────────────────────────────────

/// Banned phrase → replacement. Keys are stored lowercased with single spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseTable {
    entries: Vec<(String, String)>,
}

impl PhraseTable {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut seen = std::collections::HashSet::new();
        let entries = entries
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .filter(|(k, _)| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        Self { entries }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self::new(DEFAULT_PHRASES.iter().copied())
    }
}

/// A replaced phrase, reported back to the stage outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseHit {
    pub field_path: String,
    pub phrase: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Sanitizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PhraseSanitizer {
    /// Em dash and hyphen runs, with surrounding spaces.
    dashes: Regex,
    /// Table entries without letters or digits (other than dashes), matched literally.
    punctuation: Option<Regex>,
    /// Word phrases, longest first, whole-word bounded.
    words: Option<Regex>,
    replacements: HashMap<String, String>,
    cleanup: Vec<(Regex, &'static str)>,
}

impl PhraseSanitizer {
    pub fn new(table: &PhraseTable) -> Result<Self, regex::Error> {
        let replacements: HashMap<String, String> = table.entries.iter().cloned().collect();

        let mut word_phrases: Vec<&str> = Vec::new();
        let mut punct_phrases: Vec<&str> = Vec::new();
        for key in table.keys() {
            if key.chars().any(char::is_alphanumeric) {
                word_phrases.push(key);
            } else if !is_dash_pattern(key) {
                punct_phrases.push(key);
            }
        }

        // Multi-word before single-word, then longer before shorter.
        word_phrases.sort_by(|a, b| {
            let words = |s: &str| s.split_whitespace().count();
            words(b)
                .cmp(&words(a))
                .then(b.len().cmp(&a.len()))
                .then(a.cmp(b))
        });
        punct_phrases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let words = if word_phrases.is_empty() {
            None
        } else {
            let alternation = word_phrases
                .iter()
                .map(|p| phrase_pattern(p))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i)(?:{alternation})"))?)
        };

        let punctuation = if punct_phrases.is_empty() {
            None
        } else {
            let alternation = punct_phrases
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"[^\S\n]*(?:{alternation})[^\S\n]*"))?)
        };

        Ok(Self {
            dashes: Regex::new(r"[^\S\n]*(?:\x{2014}|-{2,})[^\S\n]*")?,
            punctuation,
            words,
            replacements,
            cleanup: vec![
                (Regex::new(r"(?m)^(?:[^\S\n]*\x{1F}[^\S\n]*(?:[,;:][^\S\n]*)?)+")?, ""),
                (
                    Regex::new(r"(?m)(?:[^\S\n]*(?:[,;:][^\S\n]*)?\x{1F}[^\S\n]*(?:[,;:][^\S\n]*)?)+$")?,
                    "",
                ),
                (Regex::new(r"\x{1F}")?, ""),
                (Regex::new(r"[^\S\n]+")?, " "),
                (Regex::new(r"[^\S\n]+([,.;:!?])")?, "$1"),
                (Regex::new(r"([,;:])(?:[^\S\n]*[,;:])+")?, "$1"),
                (Regex::new(r",([.!?])")?, "$1"),
                (Regex::new(r"(?m)^[^\S\n]+|[^\S\n]+$")?, ""),
            ],
        })
    }

    /// Sanitizes one string, returning the result and the table keys that were replaced.
    pub fn sanitize_text(&self, text: &str) -> (String, Vec<String>) {
        let mut hits = Vec::new();
        let mut current = text.to_string();

        for _ in 0..MAX_PASSES {
            let next = self.sanitize_once(&current, &mut hits);
            if next == current {
                break;
            }
            current = next;
        }

        (current, hits)
    }

    /// Convenience form of [`sanitize_text`](Self::sanitize_text) that drops the hit list.
    pub fn sanitize(&self, text: &str) -> String {
        self.sanitize_text(text).0
    }

    /// Sanitizes every free-text field of a document in place.
    pub fn sanitize_document(&self, doc: &mut ResumeDocument) -> Vec<PhraseHit> {
        let mut hits = Vec::new();
        doc.for_each_text_mut(|path, text| {
            let (clean, phrases) = self.sanitize_text(text);
            if clean != *text {
                *text = clean;
            }
            hits.extend(phrases.into_iter().map(|phrase| PhraseHit {
                field_path: path.to_string(),
                phrase,
            }));
        });
        hits
    }

    /// True if no banned phrase or dash pattern remains anywhere in `text`.
    pub fn is_clean(&self, text: &str) -> bool {
        !self.dashes.is_match(text)
            && !self.punctuation.as_ref().is_some_and(|re| re.is_match(text))
            && !self.words.as_ref().is_some_and(|re| re.is_match(text))
    }

    fn sanitize_once(&self, text: &str, hits: &mut Vec<String>) -> String {
        let mut out = self
            .dashes
            .replace_all(text, |caps: &Captures| {
                hits.push(normalize_key(caps[0].trim()));
                "\u{1F}, "
            })
            .into_owned();

        if let Some(re) = &self.punctuation {
            out = re
                .replace_all(&out, |caps: &Captures| {
                    let key = normalize_key(caps[0].trim());
                    let replacement = self.replacements.get(&key).cloned().unwrap_or_default();
                    hits.push(key);
                    if replacement.is_empty() {
                        DELETED.to_string()
                    } else {
                        replacement
                    }
                })
                .into_owned();
        }

        if let Some(re) = &self.words {
            out = re
                .replace_all(&out, |caps: &Captures| {
                    let matched = &caps[0];
                    let key = normalize_key(matched);
                    let replacement = self.replacements.get(&key).cloned().unwrap_or_default();
                    hits.push(key);
                    match_leading_case(matched, &replacement)
                })
                .into_owned();
        }

        if out == text {
            return out;
        }

        for (re, replacement) in &self.cleanup {
            out = re.replace_all(&out, *replacement).into_owned();
        }
        let out = out.trim().to_string();

        restore_leading_capital(text, out)
    }
}

impl Default for PhraseSanitizer {
    fn default() -> Self {
        Self::new(&PhraseTable::default()).expect("default phrase table compiles")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn normalize_key(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_dash_pattern(key: &str) -> bool {
    key == "\u{2014}" || (key.len() >= 2 && key.chars().all(|c| c == '-'))
}

/// Regex for one phrase: words joined by flexible whitespace, bounded by `\b`
/// on any side that starts or ends with a word character.
fn phrase_pattern(phrase: &str) -> String {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let starts_word = phrase.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = phrase.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        body,
        if ends_word { r"\b" } else { "" }
    )
}

/// "Spearheaded" → "Led", "spearheaded" → "led", "ROBUST" → "STRONG".
fn match_leading_case(matched: &str, replacement: &str) -> String {
    if replacement.is_empty() {
        return DELETED.to_string();
    }
    let letters = matched.chars().filter(|c| c.is_alphabetic()).count();
    let all_caps = letters > 1 && !matched.chars().any(char::is_lowercase);
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    if all_caps {
        replacement.to_uppercase()
    } else if starts_upper {
        capitalize_first(replacement)
    } else {
        replacement.to_string()
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// If a deleted leading phrase exposed a lowercase word, capitalize it again.
fn restore_leading_capital(original: &str, sanitized: String) -> String {
    let original_upper = original
        .trim_start()
        .chars()
        .next()
        .is_some_and(char::is_uppercase);
    let sanitized_lower = sanitized.chars().next().is_some_and(char::is_lowercase);
    if original_upper && sanitized_lower {
        capitalize_first(&sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomSection, ResumeDocument, WorkEntry};

    fn sanitizer() -> PhraseSanitizer {
        PhraseSanitizer::default()
    }

    #[test]
    fn test_replaces_single_word_preserving_case() {
        let s = sanitizer();
        assert_eq!(
            s.sanitize("Spearheaded migration and leveraged Kafka"),
            "Led migration and used Kafka"
        );
    }

    #[test]
    fn test_multi_word_phrase_beats_single_word() {
        let s = sanitizer();
        assert_eq!(s.sanitize("Drove a paradigm shift in testing"), "Drove a change in testing");
        assert_eq!(s.sanitize("A new paradigm for testing"), "A new approach for testing");
    }

    #[test]
    fn test_does_not_match_inside_larger_word() {
        let s = sanitizer();
        assert_eq!(
            s.sanitize("Improved robustness of the scheduler"),
            "Improved robustness of the scheduler"
        );
        assert_eq!(s.sanitize("Wrote unscalable code"), "Wrote unscalable code");
    }

    #[test]
    fn test_em_dash_becomes_comma_and_single_space() {
        let s = sanitizer();
        assert_eq!(
            s.sanitize("Built the pipeline\u{2014}cut costs by 20%"),
            "Built the pipeline, cut costs by 20%"
        );
        assert_eq!(
            s.sanitize("Built the pipeline \u{2014} cut costs"),
            "Built the pipeline, cut costs"
        );
    }

    #[test]
    fn test_double_and_triple_hyphen_become_comma() {
        let s = sanitizer();
        assert_eq!(s.sanitize("Shipped v2 -- on time"), "Shipped v2, on time");
        assert_eq!(s.sanitize("Shipped v2---on time"), "Shipped v2, on time");
        // Single hyphens are left alone.
        assert_eq!(s.sanitize("Built a real-time feed"), "Built a real-time feed");
    }

    #[test]
    fn test_empty_replacement_leaves_no_orphans() {
        let s = sanitizer();
        assert_eq!(
            s.sanitize("Moving forward, the team adopted Rust."),
            "The team adopted Rust."
        );
        assert_eq!(
            s.sanitize("We shipped weekly at the end of the day."),
            "We shipped weekly."
        );
        assert_eq!(
            s.sanitize("Cut costs, going forward, by 10%"),
            "Cut costs, by 10%"
        );
    }

    #[test]
    fn test_filler_phrase_simplified() {
        let s = sanitizer();
        assert_eq!(
            s.sanitize("Refactored the API in order to reduce latency"),
            "Refactored the API to reduce latency"
        );
        assert_eq!(
            s.sanitize("Reported metrics on a daily basis"),
            "Reported metrics daily"
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let s = sanitizer();
        assert_eq!(s.sanitize("A Robust system"), "A Strong system");
        assert_eq!(s.sanitize("IN ORDER TO ship"), "TO ship");
    }

    #[test]
    fn test_all_caps_match_keeps_all_caps() {
        let s = sanitizer();
        assert_eq!(s.sanitize("A ROBUST system"), "A STRONG system");
        assert_eq!(s.sanitize("LEVERAGED Kafka"), "USED Kafka");
        assert_eq!(s.sanitize("Leveraged Kafka"), "Used Kafka");
    }

    #[test]
    fn test_writer_punctuation_at_line_edges_is_kept() {
        let s = sanitizer();
        assert_eq!(s.sanitize("Utilized the following:"), "Used the following:");
        assert_eq!(
            s.sanitize("Spearheaded three efforts:\n: CI, caching; and alerts;"),
            "Led three efforts:\n: CI, caching; and alerts;"
        );
        // Separators left behind by a deletion are still removed.
        assert_eq!(s.sanitize("Going forward, we shipped"), "We shipped");
        assert_eq!(s.sanitize("We shipped it, going forward"), "We shipped it");
        assert_eq!(
            s.sanitize("At the end of the day, -- robust outputs."),
            "Strong outputs."
        );
        assert_eq!(s.sanitize("Shipped v2 \u{2014}"), "Shipped v2");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let s = sanitizer();
        let inputs = [
            "Spearheaded a paradigm shift\u{2014}in order to move the needle",
            "At the end of the day, -- robust, scalable deliverables.",
            "Utilized best-in-class tooling , , going forward.",
            "Plain text with nothing to change.",
            "",
        ];
        for input in inputs {
            let once = s.sanitize(input);
            let twice = s.sanitize(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_no_table_key_survives() {
        let s = sanitizer();
        let table = PhraseTable::default();
        let mut text = table.keys().collect::<Vec<_>>().join(" and ");
        text.push_str(" \u{2014} ending");
        let clean = s.sanitize(&text);
        assert!(s.is_clean(&clean), "leftover phrase in {clean:?}");
        assert!(!clean.contains('\u{2014}'));
    }

    #[test]
    fn test_hits_are_reported() {
        let s = sanitizer();
        let (_, hits) = s.sanitize_text("Leveraged synergy \u{2014} fast");
        assert!(hits.contains(&"leveraged".to_string()));
        assert!(hits.contains(&"synergy".to_string()));
        assert!(hits.contains(&"\u{2014}".to_string()));
    }

    #[test]
    fn test_custom_table_substitution() {
        let table = PhraseTable::new([("ninja", "engineer"), ("rockstar", "")]);
        let s = PhraseSanitizer::new(&table).unwrap();
        assert_eq!(s.sanitize("Rockstar ninja"), "Engineer");
        // Leveraged is not in this table.
        assert_eq!(s.sanitize("leveraged"), "leveraged");
        // Dashes are always replaced regardless of the table.
        assert_eq!(s.sanitize("a\u{2014}b"), "a, b");
    }

    #[test]
    fn test_sanitize_document_touches_every_text_field() {
        let s = sanitizer();
        let mut doc = ResumeDocument {
            summary: "Holistic engineer\u{2014}ships fast".to_string(),
            work_experience: vec![WorkEntry {
                id: 1,
                company: "Acme \u{2014} Labs".to_string(),
                description: vec!["Orchestrated releases".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };
        doc.custom_sections.insert(
            "volunteer".to_string(),
            CustomSection::Text {
                text: "Facilitated workshops".to_string(),
            },
        );

        let hits = s.sanitize_document(&mut doc);

        assert_eq!(doc.summary, "Comprehensive engineer, ships fast");
        assert_eq!(doc.work_experience[0].description[0], "Coordinated releases");
        assert_eq!(
            doc.custom_sections["volunteer"],
            CustomSection::Text {
                text: "Helped workshops".to_string()
            }
        );
        // Company names are not free text and stay byte-identical.
        assert_eq!(doc.work_experience[0].company, "Acme \u{2014} Labs");
        assert!(hits.iter().any(|h| h.field_path == "summary"));
        assert!(hits
            .iter()
            .any(|h| h.field_path == "workExperience[1].description[0]"));
    }
}
