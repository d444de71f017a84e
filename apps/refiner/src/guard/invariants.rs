//! Invariant checker: diffs a stage candidate against its predecessor under a
//! mutation envelope, repairing what it can.
//!
//! Checks run in a fixed order:
//!
//! 1. Shape: every predecessor entry id survives; unknown or duplicated ids are dropped
//! 2. Immutable fields: company, location, dates, institution, contact details and
//!    the certification list are overwritten from the predecessor
//! 3. Bullets: count bound, elaboration threshold, per-bullet character cap
//! 4. Skills: additions dropped when forbidden, losses restored when growth is allowed
//! 5. Banned sections
//! 6. Titles restored when rewriting is not allowed
//!
//! A candidate that loses content (an entry, a bullet) cannot be repaired and is
//! rejected; everything else is repaired in place and recorded.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::guard::sections::SectionFilter;
use crate::models::resume::{skill_key, CustomItem, Identified};
use crate::models::{CustomSection, ResumeDocument, WorkEntry};
use crate::policy::{BulletBound, MutationEnvelope};

/// Words shorter than this are ignored when measuring bullet overlap.
const MIN_OVERLAP_WORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "that", "this", "our", "was", "were", "are",
    "has", "have", "had", "its", "their", "over", "across", "using", "via",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardStatus {
    Accepted,
    Repaired,
    Rejected,
}

impl std::fmt::Display for GuardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GuardStatus::Accepted => "accepted",
            GuardStatus::Repaired => "repaired",
            GuardStatus::Rejected => "rejected",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Shape,
    ImmutableField,
    BulletCount,
    NewContent,
    BulletLength,
    SkillGrowth,
    BannedSection,
    Title,
    CustomSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub check: CheckKind,
    pub field_path: String,
    pub detail: String,
    /// False when the violation could not be repaired and forced a rejection.
    pub repaired: bool,
}

#[derive(Debug, Clone)]
pub struct GuardResult {
    pub status: GuardStatus,
    pub violations: Vec<Violation>,
    /// The repaired candidate. Meaningless when `status` is `Rejected`.
    pub document: ResumeDocument,
}

impl GuardResult {
    pub fn irrecoverable(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.repaired)
    }
}

#[derive(Default)]
struct Findings {
    violations: Vec<Violation>,
}

impl Findings {
    fn repaired(&mut self, check: CheckKind, field_path: impl Into<String>, detail: impl Into<String>) {
        self.violations.push(Violation {
            check,
            field_path: field_path.into(),
            detail: detail.into(),
            repaired: true,
        });
    }

    fn fatal(&mut self, check: CheckKind, field_path: impl Into<String>, detail: impl Into<String>) {
        self.violations.push(Violation {
            check,
            field_path: field_path.into(),
            detail: detail.into(),
            repaired: false,
        });
    }

    fn has_fatal(&self) -> bool {
        self.violations.iter().any(|v| !v.repaired)
    }

    fn into_result(self, document: ResumeDocument) -> GuardResult {
        let status = if self.has_fatal() {
            GuardStatus::Rejected
        } else if self.violations.is_empty() {
            GuardStatus::Accepted
        } else {
            GuardStatus::Repaired
        };
        GuardResult {
            status,
            violations: self.violations,
            document,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvariantChecker {
    sections: SectionFilter,
}

impl InvariantChecker {
    pub fn new(sections: SectionFilter) -> Self {
        Self { sections }
    }

    pub fn section_filter(&self) -> &SectionFilter {
        &self.sections
    }

    pub fn check(
        &self,
        prior: &ResumeDocument,
        mut candidate: ResumeDocument,
        envelope: &MutationEnvelope,
    ) -> GuardResult {
        let mut f = Findings::default();

        // 1. Shape
        reconcile_entries("workExperience", &prior.work_experience, &mut candidate.work_experience, &mut f);
        reconcile_entries("education", &prior.education, &mut candidate.education, &mut f);
        reconcile_entries(
            "personalProjects",
            &prior.personal_projects,
            &mut candidate.personal_projects,
            &mut f,
        );
        if f.has_fatal() {
            return f.into_result(candidate);
        }
        self.reconcile_custom_sections(prior, &mut candidate, envelope, &mut f);

        // 2. Immutable fields
        restore_immutable(prior, &mut candidate, &mut f);

        // 3. Bullets
        let pairs = pair_by_occurrence(&prior.work_experience, &candidate.work_experience);
        for (entry, slot) in candidate.work_experience.iter_mut().zip(pairs) {
            if let Some(before) = slot.map(|i| &prior.work_experience[i]) {
                check_work_bullets(before, entry, envelope, &mut f);
            }
        }
        if !envelope.allow_new_bullets {
            let pairs = pair_by_occurrence(&prior.personal_projects, &candidate.personal_projects);
            for (entry, slot) in candidate.personal_projects.iter_mut().zip(pairs) {
                if let Some(before) = slot.map(|i| &prior.personal_projects[i]) {
                    let path = format!("personalProjects[{}].description", entry.id);
                    check_unchanged_count(&path, before.description.len(), &mut entry.description, &mut f);
                }
            }
        }

        // 4. Skills
        check_skills(prior, &mut candidate, envelope, &mut f);

        // 5. Banned sections
        for path in self.sections.filter_in_place(&mut candidate) {
            f.repaired(CheckKind::BannedSection, path, "blacklisted section removed");
        }

        // 6. Titles
        if !envelope.allow_title_rewrite {
            restore_titles(prior, &mut candidate, &mut f);
        }

        f.into_result(candidate)
    }

    fn reconcile_custom_sections(
        &self,
        prior: &ResumeDocument,
        candidate: &mut ResumeDocument,
        envelope: &MutationEnvelope,
        f: &mut Findings,
    ) {
        for (key, before) in &prior.custom_sections {
            let path = format!("customSections.{key}");
            if self.sections.blacklist().is_banned(key) {
                continue;
            }
            if !candidate.custom_sections.contains_key(key) {
                candidate.custom_sections.insert(key.clone(), before.clone());
                f.repaired(CheckKind::CustomSection, path, "section dropped; restored");
                continue;
            }
            let Some(after) = candidate.custom_sections.get_mut(key) else {
                continue;
            };
            match (before, after) {
                (CustomSection::ItemList { items: prior_items }, CustomSection::ItemList { items }) => {
                    reconcile_items(&path, prior_items, items, f);
                }
                (before, after) if before.type_name() != after.type_name() => {
                    let detail = format!(
                        "section type changed from {} to {}; restored",
                        before.type_name(),
                        after.type_name()
                    );
                    *after = before.clone();
                    f.repaired(CheckKind::CustomSection, path, detail);
                }
                _ => {}
            }
        }

        if envelope.fixed_section_set {
            candidate.custom_sections.retain(|key, _| {
                if prior.custom_sections.contains_key(key) {
                    true
                } else {
                    f.repaired(
                        CheckKind::CustomSection,
                        format!("customSections.{key}"),
                        "section not in the source; removed",
                    );
                    false
                }
            });
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shape
// ────────────────────────────────────────────────────────────────────────────

fn reconcile_entries<T: Identified>(list: &str, prior: &[T], candidate: &mut Vec<T>, f: &mut Findings) {
    let mut remaining: HashMap<u32, usize> = HashMap::new();
    for entry in prior {
        *remaining.entry(entry.id()).or_default() += 1;
    }

    let mut duplicated = Vec::new();
    let mut unknown = Vec::new();
    candidate.retain(|entry| match remaining.get_mut(&entry.id()) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        Some(_) => {
            duplicated.push(entry.id());
            false
        }
        None => {
            unknown.push(entry.id());
            false
        }
    });

    for id in duplicated {
        f.repaired(CheckKind::Shape, format!("{list}[{id}]"), "duplicate entry id; extra copy removed");
    }
    for id in unknown {
        f.repaired(CheckKind::Shape, format!("{list}[{id}]"), "entry not in the source; removed");
    }

    let mut missing: Vec<u32> = remaining
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(id, _)| id)
        .collect();
    missing.sort_unstable();
    for id in missing {
        f.fatal(CheckKind::Shape, format!("{list}[{id}]"), "entry missing from candidate");
    }
}

/// Index of the matching predecessor entry for each candidate entry. The n-th
/// candidate entry with a given id pairs with the n-th predecessor entry with it.
fn pair_by_occurrence<T: Identified>(prior: &[T], candidate: &[T]) -> Vec<Option<usize>> {
    let mut slots: HashMap<u32, VecDeque<usize>> = HashMap::new();
    for (i, entry) in prior.iter().enumerate() {
        slots.entry(entry.id()).or_default().push_back(i);
    }
    candidate
        .iter()
        .map(|entry| slots.get_mut(&entry.id()).and_then(VecDeque::pop_front))
        .collect()
}

fn reconcile_items(path: &str, prior: &[CustomItem], items: &mut Vec<CustomItem>, f: &mut Findings) {
    let prior_ids: HashSet<u32> = prior.iter().map(|i| i.id).collect();
    let mut seen = HashSet::new();
    items.retain(|item| {
        if prior_ids.contains(&item.id) && seen.insert(item.id) {
            true
        } else {
            f.repaired(
                CheckKind::CustomSection,
                format!("{path}.items[{}]", item.id),
                "item not in the source; removed",
            );
            false
        }
    });

    for (index, before) in prior.iter().enumerate() {
        if !items.iter().any(|i| i.id == before.id) {
            items.insert(index.min(items.len()), before.clone());
            f.repaired(
                CheckKind::CustomSection,
                format!("{path}.items[{}]", before.id),
                "item dropped; restored",
            );
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Immutable fields
// ────────────────────────────────────────────────────────────────────────────

fn restore_field(f: &mut Findings, path: String, expected: &str, actual: &mut String) {
    if actual != expected {
        let detail = format!("changed from {expected:?} to {actual:?}; restored");
        *actual = expected.to_string();
        f.repaired(CheckKind::ImmutableField, path, detail);
    }
}

fn restore_optional(f: &mut Findings, path: &str, expected: &Option<String>, actual: &mut Option<String>) {
    if actual != expected {
        *actual = expected.clone();
        f.repaired(CheckKind::ImmutableField, path, "contact detail changed; restored");
    }
}

fn restore_immutable(prior: &ResumeDocument, candidate: &mut ResumeDocument, f: &mut Findings) {
    let before = &prior.personal_info;
    let after = &mut candidate.personal_info;
    restore_field(f, "personalInfo.name".into(), &before.name, &mut after.name);
    restore_optional(f, "personalInfo.email", &before.email, &mut after.email);
    restore_optional(f, "personalInfo.phone", &before.phone, &mut after.phone);
    restore_optional(f, "personalInfo.location", &before.location, &mut after.location);
    restore_optional(f, "personalInfo.website", &before.website, &mut after.website);
    restore_optional(f, "personalInfo.linkedin", &before.linkedin, &mut after.linkedin);
    restore_optional(f, "personalInfo.github", &before.github, &mut after.github);

    let pairs = pair_by_occurrence(&prior.work_experience, &candidate.work_experience);
    for (entry, slot) in candidate.work_experience.iter_mut().zip(pairs) {
        let Some(before) = slot.map(|i| &prior.work_experience[i]) else {
            continue;
        };
        let id = entry.id;
        restore_field(f, format!("workExperience[{id}].company"), &before.company, &mut entry.company);
        restore_field(f, format!("workExperience[{id}].location"), &before.location, &mut entry.location);
        restore_field(f, format!("workExperience[{id}].years"), &before.years, &mut entry.years);
    }

    let pairs = pair_by_occurrence(&prior.education, &candidate.education);
    for (entry, slot) in candidate.education.iter_mut().zip(pairs) {
        let Some(before) = slot.map(|i| &prior.education[i]) else {
            continue;
        };
        let id = entry.id;
        restore_field(
            f,
            format!("education[{id}].institution"),
            &before.institution,
            &mut entry.institution,
        );
        restore_field(f, format!("education[{id}].years"), &before.years, &mut entry.years);
        if before.description.is_none() && entry.description.is_some() {
            entry.description = None;
            f.repaired(
                CheckKind::ImmutableField,
                format!("education[{id}].description"),
                "description added to education entry; removed",
            );
        }
    }

    let pairs = pair_by_occurrence(&prior.personal_projects, &candidate.personal_projects);
    for (entry, slot) in candidate.personal_projects.iter_mut().zip(pairs) {
        let Some(before) = slot.map(|i| &prior.personal_projects[i]) else {
            continue;
        };
        restore_field(
            f,
            format!("personalProjects[{}].years", entry.id),
            &before.years,
            &mut entry.years,
        );
    }

    if candidate.additional.certifications_training != prior.additional.certifications_training {
        candidate.additional.certifications_training = prior.additional.certifications_training.clone();
        f.repaired(
            CheckKind::ImmutableField,
            "additional.certificationsTraining",
            "certifications changed; restored",
        );
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bullets
// ────────────────────────────────────────────────────────────────────────────

fn check_unchanged_count(path: &str, prior_count: usize, bullets: &mut Vec<String>, f: &mut Findings) {
    let count = bullets.len();
    if count > prior_count {
        bullets.truncate(prior_count);
        f.repaired(
            CheckKind::NewContent,
            path,
            format!("{count} bullets where {prior_count} were given; extras removed"),
        );
    } else if count < prior_count {
        f.fatal(
            CheckKind::BulletCount,
            path,
            format!("{count} bullets where {prior_count} were given"),
        );
    }
}

fn check_work_bullets(before: &WorkEntry, entry: &mut WorkEntry, env: &MutationEnvelope, f: &mut Findings) {
    let path = format!("workExperience[{}].description", entry.id);
    let prior_count = before.description.len();

    match env.bullets_per_entry {
        BulletBound::Unchanged => {
            check_unchanged_count(&path, prior_count, &mut entry.description, f);
        }
        BulletBound::Exactly(n) => {
            let count = entry.description.len();
            if count > n {
                entry.description.truncate(n);
                f.repaired(
                    CheckKind::BulletCount,
                    path.as_str(),
                    format!("{count} bullets where exactly {n} are required; extras removed"),
                );
            } else if count < n {
                f.fatal(
                    CheckKind::BulletCount,
                    path.as_str(),
                    format!("{count} bullets where exactly {n} are required"),
                );
            }
        }
        BulletBound::Unbounded => {
            let count = entry.description.len();
            if count < prior_count {
                f.fatal(
                    CheckKind::BulletCount,
                    path.as_str(),
                    format!("{count} bullets where {prior_count} were given; content lost"),
                );
            } else if count > prior_count && !env.allow_new_bullets {
                check_unchanged_count(&path, prior_count, &mut entry.description, f);
            } else if count > prior_count {
                drop_unrelated_bullets(&path, before, entry, env.elaboration_threshold, f);
            }
        }
    }

    if let Some(cap) = env.max_bullet_chars {
        for (i, bullet) in entry.description.iter_mut().enumerate() {
            let len = bullet.chars().count();
            if len > cap {
                *bullet = truncate_at_word(bullet, cap);
                f.repaired(
                    CheckKind::BulletLength,
                    format!("{path}[{i}]"),
                    format!("{len} characters exceeds the {cap} cap; truncated"),
                );
            }
        }
    }
}

/// Bullets past the prior count must share at least `threshold` of their words
/// with the entry's prior bullets to count as elaboration.
fn drop_unrelated_bullets(
    path: &str,
    before: &WorkEntry,
    entry: &mut WorkEntry,
    threshold: f32,
    f: &mut Findings,
) {
    if threshold <= 0.0 {
        return;
    }
    let known = word_set(before.description.iter().map(String::as_str));
    let prior_count = before.description.len();

    let mut index = 0;
    entry.description.retain(|bullet| {
        let i = index;
        index += 1;
        if i < prior_count {
            return true;
        }
        let overlap = word_overlap(bullet, &known);
        if overlap >= threshold {
            true
        } else {
            f.repaired(
                CheckKind::NewContent,
                format!("{path}[{i}]"),
                format!("new bullet overlaps {overlap:.2} with existing work, below {threshold:.2}; removed"),
            );
            false
        }
    });
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_OVERLAP_WORD_LEN)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

fn word_set<'a>(texts: impl Iterator<Item = &'a str>) -> HashSet<String> {
    texts.flat_map(words).collect()
}

/// Share of `text`'s distinct words that appear in `known`.
pub(crate) fn word_overlap(text: &str, known: &HashSet<String>) -> f32 {
    let own: HashSet<String> = words(text).collect();
    if own.is_empty() {
        return 0.0;
    }
    let shared = own.iter().filter(|w| known.contains(*w)).count();
    shared as f32 / own.len() as f32
}

/// Cuts to at most `max_chars` characters, backing up to the last whitespace.
pub(crate) fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let prefix = &text[..cut];
    let at_boundary = text[cut..].starts_with(char::is_whitespace);
    let kept = if at_boundary {
        prefix
    } else {
        match prefix.rfind(char::is_whitespace) {
            Some(space) if space > 0 => &prefix[..space],
            _ => prefix,
        }
    };
    kept.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'))
        .to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Skills and titles
// ────────────────────────────────────────────────────────────────────────────

fn check_skills(prior: &ResumeDocument, candidate: &mut ResumeDocument, env: &MutationEnvelope, f: &mut Findings) {
    let prior_keys: HashSet<String> = prior
        .additional
        .technical_skills
        .iter()
        .map(|s| skill_key(s))
        .collect();

    if env.allow_new_skills {
        let present: HashSet<String> = candidate
            .additional
            .technical_skills
            .iter()
            .map(|s| skill_key(s))
            .collect();
        for skill in &prior.additional.technical_skills {
            if !present.contains(&skill_key(skill)) {
                candidate.additional.technical_skills.push(skill.clone());
                f.repaired(
                    CheckKind::SkillGrowth,
                    "additional.technicalSkills",
                    format!("skill {skill:?} dropped; restored"),
                );
            }
        }
    } else {
        let mut added = Vec::new();
        candidate.additional.technical_skills.retain(|skill| {
            if prior_keys.contains(&skill_key(skill)) {
                true
            } else {
                added.push(skill.clone());
                false
            }
        });
        for skill in added {
            f.repaired(
                CheckKind::SkillGrowth,
                "additional.technicalSkills",
                format!("skill {skill:?} not in the source; removed"),
            );
        }
    }

    candidate.additional.dedup_skills();
}

fn restore_titles(prior: &ResumeDocument, candidate: &mut ResumeDocument, f: &mut Findings) {
    let pairs = pair_by_occurrence(&prior.work_experience, &candidate.work_experience);
    for (entry, slot) in candidate.work_experience.iter_mut().zip(pairs) {
        let Some(before) = slot.map(|i| &prior.work_experience[i]) else {
            continue;
        };
        if entry.title != before.title {
            let detail = format!("title changed from {:?} to {:?}; restored", before.title, entry.title);
            entry.title = before.title.clone();
            f.repaired(CheckKind::Title, format!("workExperience[{}].title", entry.id), detail);
        }
    }
    if candidate.personal_info.title != prior.personal_info.title {
        candidate.personal_info.title = prior.personal_info.title.clone();
        f.repaired(CheckKind::Title, "personalInfo.title", "headline title changed; restored");
    }
}
