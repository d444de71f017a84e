use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// The structured resume that flows through every refinement stage.
///
/// Serialized as camelCase JSON; the same shape the generation collaborator
/// is shown in the schema example and must hand back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub work_experience: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub personal_projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub additional: Additional,
    #[serde(default)]
    pub custom_sections: BTreeMap<String, CustomSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

/// One position. `company`, `location` and `years` are immutable across stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    /// Date range, e.g. "2020 - Present".
    #[serde(default)]
    pub years: String,
    /// Bullets, in display order.
    #[serde(default)]
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: u32,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub years: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub years: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Additional {
    /// Insertion-ordered set; see [`Additional::dedup_skills`].
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Immutable across every stage and every mode.
    #[serde(default)]
    pub certifications_training: Vec<String>,
    #[serde(default)]
    pub awards: Vec<String>,
}

impl Additional {
    /// Drops repeated skills (case-insensitive), keeping the first spelling.
    /// Returns the dropped entries.
    pub fn dedup_skills(&mut self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dropped = Vec::new();
        self.technical_skills.retain(|skill| {
            if seen.insert(skill_key(skill)) {
                true
            } else {
                dropped.push(skill.clone());
                false
            }
        });
        dropped
    }
}

/// Normalized comparison key for a skill name.
pub fn skill_key(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// A user-defined section. The `sectionType` tag selects the body shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sectionType", rename_all = "camelCase")]
pub enum CustomSection {
    Text {
        #[serde(default)]
        text: String,
    },
    ItemList {
        #[serde(default)]
        items: Vec<CustomItem>,
    },
    StringList {
        #[serde(default)]
        strings: Vec<String>,
    },
}

impl CustomSection {
    pub fn type_name(&self) -> &'static str {
        match self {
            CustomSection::Text { .. } => "text",
            CustomSection::ItemList { .. } => "itemList",
            CustomSection::StringList { .. } => "stringList",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomItem {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

/// Entries that carry a per-list id.
pub trait Identified {
    fn id(&self) -> u32;
    fn set_id(&mut self, id: u32);
}

impl Identified for WorkEntry {
    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }
}

impl Identified for EducationEntry {
    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }
}

impl Identified for ProjectEntry {
    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }
}

impl Identified for CustomItem {
    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }
}

/// One past the highest id currently in the list.
pub fn next_id<T: Identified>(entries: &[T]) -> u32 {
    entries.iter().map(Identified::id).max().unwrap_or(0) + 1
}

/// Gives every zero or repeated id a fresh one, keeping the first holder of
/// each id. Returns `(old, new)` for each renumbered entry.
pub fn renumber_ids<T: Identified>(entries: &mut [T]) -> Vec<(u32, u32)> {
    let mut seen = std::collections::HashSet::new();
    let mut changed = Vec::new();
    for i in 0..entries.len() {
        let id = entries[i].id();
        if id != 0 && seen.insert(id) {
            continue;
        }
        let fresh = next_id(entries);
        entries[i].set_id(fresh);
        seen.insert(fresh);
        changed.push((id, fresh));
    }
    changed
}

// ────────────────────────────────────────────────────────────────────────────
// Free-text traversal
// ────────────────────────────────────────────────────────────────────────────

impl ResumeDocument {
    /// Renumbers zero or duplicate ids in the entry lists. Returns the old
    /// and new field path of each entry that moved.
    pub fn normalize_ids(&mut self) -> Vec<(String, String)> {
        fn paths(list: &str, changed: Vec<(u32, u32)>) -> impl Iterator<Item = (String, String)> + '_ {
            changed
                .into_iter()
                .map(move |(old, new)| (format!("{list}[{old}]"), format!("{list}[{new}]")))
        }
        let mut moved = Vec::new();
        moved.extend(paths("workExperience", renumber_ids(&mut self.work_experience)));
        moved.extend(paths("education", renumber_ids(&mut self.education)));
        moved.extend(paths("personalProjects", renumber_ids(&mut self.personal_projects)));
        moved
    }

    /// Visits every free-text field with its field path: summary, work and project
    /// bullets, education descriptions and every custom-section body.
    pub fn for_each_text_mut(&mut self, mut visit: impl FnMut(&str, &mut String)) {
        visit("summary", &mut self.summary);

        for entry in &mut self.work_experience {
            for (i, bullet) in entry.description.iter_mut().enumerate() {
                visit(&format!("workExperience[{}].description[{i}]", entry.id), bullet);
            }
        }

        for entry in &mut self.education {
            if let Some(text) = entry.description.as_mut() {
                visit(&format!("education[{}].description", entry.id), text);
            }
        }

        for entry in &mut self.personal_projects {
            for (i, bullet) in entry.description.iter_mut().enumerate() {
                visit(
                    &format!("personalProjects[{}].description[{i}]", entry.id),
                    bullet,
                );
            }
        }

        for (key, section) in &mut self.custom_sections {
            match section {
                CustomSection::Text { text } => {
                    visit(&format!("customSections.{key}.text"), text);
                }
                CustomSection::ItemList { items } => {
                    for item in items {
                        for (i, bullet) in item.description.iter_mut().enumerate() {
                            visit(
                                &format!("customSections.{key}.items[{}].description[{i}]", item.id),
                                bullet,
                            );
                        }
                    }
                }
                CustomSection::StringList { strings } => {
                    for (i, s) in strings.iter_mut().enumerate() {
                        visit(&format!("customSections.{key}.strings[{i}]"), s);
                    }
                }
            }
        }
    }

    /// Collects every free-text field as `(field_path, text)` pairs.
    pub fn texts(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        // Traverse a scratch copy so the visitor signature can stay `&mut`.
        let mut scratch = self.clone();
        scratch.for_each_text_mut(|path, text| out.push((path.to_string(), text.clone())));
        out
    }

    /// Bullet text that may carry quantitative claims, with field paths.
    pub fn bullets(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        for entry in &self.work_experience {
            for (i, bullet) in entry.description.iter().enumerate() {
                out.push((
                    format!("workExperience[{}].description[{i}]", entry.id),
                    bullet.as_str(),
                ));
            }
        }
        for entry in &self.personal_projects {
            for (i, bullet) in entry.description.iter().enumerate() {
                out.push((
                    format!("personalProjects[{}].description[{i}]", entry.id),
                    bullet.as_str(),
                ));
            }
        }
        for (key, section) in &self.custom_sections {
            if let CustomSection::ItemList { items } = section {
                for item in items {
                    for (i, bullet) in item.description.iter().enumerate() {
                        out.push((
                            format!("customSections.{key}.items[{}].description[{i}]", item.id),
                            bullet.as_str(),
                        ));
                    }
                }
            }
        }
        out
    }
}
