//! Metric realism checker: locates quantitative claims in bullet text and
//! flags the ones outside plausible bands.
//!
//! Flags are advisory. Nothing is ever deleted here; the pipeline either feeds
//! flags to a metric-verification pass or attaches them to the stage outcome.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{ResumeDocument, Seniority};

/// Words attached to a percentage that mark it as a level, not an improvement
/// ("99.9% uptime", "coverage to 92%"). Such claims are recorded, not banded.
const PERCENT_LEVEL_WORDS: &str = "uptime|availability|sla|accuracy|coverage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Percentage,
    TeamSize,
    Currency,
}

/// Inclusive plausibility band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricBands {
    pub percent: Band,
    pub team_junior: Band,
    pub team_mid: Band,
    pub team_senior: Band,
    pub team_lead: Band,
}

impl MetricBands {
    pub fn team_size(&self, seniority: Seniority) -> Band {
        match seniority {
            Seniority::Junior => self.team_junior,
            Seniority::Mid => self.team_mid,
            Seniority::Senior => self.team_senior,
            Seniority::Lead => self.team_lead,
        }
    }
}

impl Default for MetricBands {
    fn default() -> Self {
        Self {
            percent: Band::new(5.0, 45.0),
            team_junior: Band::new(2.0, 5.0),
            team_mid: Band::new(3.0, 8.0),
            team_senior: Band::new(5.0, 15.0),
            team_lead: Band::new(8.0, 25.0),
        }
    }
}

/// A quantitative claim found in bullet text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricClaim {
    pub field_path: String,
    pub kind: MetricKind,
    /// The matched text, e.g. `"90%"` or `"team of 40"`.
    pub text: String,
    /// Normalized value: percent points, head count, or currency units.
    pub value: f64,
}

/// A claim outside its band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFlag {
    pub field_path: String,
    pub kind: MetricKind,
    pub text: String,
    pub value: f64,
    pub band: Band,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricReport {
    pub claims: Vec<MetricClaim>,
    pub flags: Vec<MetricFlag>,
}

impl MetricReport {
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MetricRealismChecker {
    bands: MetricBands,
    percent: Regex,
    /// Level word right after a percentage, at most one word between.
    level_after: Regex,
    /// Level word right before a percentage, at most one linking word between.
    level_before: Regex,
    team: Vec<Regex>,
    currency: Regex,
}

impl MetricRealismChecker {
    pub fn new(bands: MetricBands) -> Result<Self, regex::Error> {
        const PEOPLE: &str = "people|persons?|members?|engineers?|developers?|designers?|\
                              analysts?|scientists?|reports|direct reports|interns?|\
                              employees|staff|contractors?";
        Ok(Self {
            bands,
            percent: Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:%|percent\b)")?,
            level_after: Regex::new(&format!(
                r"(?i)^\s*(?:[a-z-]+\s+)?(?:{PERCENT_LEVEL_WORDS})\b"
            ))?,
            level_before: Regex::new(&format!(
                r"(?i)\b(?:{PERCENT_LEVEL_WORDS})\s*(?:(?:of|to|at|above|near|around|from)\s+|:\s*)?$"
            ))?,
            team: vec![
                Regex::new(r"(?i)\b(?:team|group|squad|staff|organi[sz]ation)\s+of\s+(\d+)\b")?,
                Regex::new(
                    r"(?i)\b(\d+)[-\s](?:person|people|member|engineer|developer)s?\s+(?:[a-z-]+\s+)?(?:team|squad|group|crew|organi[sz]ation)\b",
                )?,
                Regex::new(&format!(
                    r"(?i)\b(?:managed|led|mentored|supervised|coached|hired)\s+(\d+)\s+(?:\w+\s+)?(?:{PEOPLE})\b"
                ))?,
            ],
            currency: Regex::new(
                r"(?i)([$€£])\s?(\d+(?:[.,]\d+)*)\s*(billion|million|thousand|bn|[kmb])?\b",
            )?,
        })
    }

    pub fn bands(&self) -> &MetricBands {
        &self.bands
    }

    /// Checks every bullet in the document.
    pub fn check(&self, doc: &ResumeDocument, seniority: Seniority) -> MetricReport {
        let mut report = MetricReport::default();
        for (path, bullet) in doc.bullets() {
            let one = self.check_text(&path, bullet, seniority);
            report.claims.extend(one.claims);
            report.flags.extend(one.flags);
        }
        report
    }

    pub fn check_text(&self, field_path: &str, text: &str, seniority: Seniority) -> MetricReport {
        let mut report = MetricReport::default();
        // Start offsets of numbers already claimed, so overlapping team patterns count once.
        let mut claimed: Vec<usize> = Vec::new();

        for caps in self.percent.captures_iter(text) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(value) = number.as_str().parse::<f64>() else {
                continue;
            };
            claimed.push(number.start());
            let claim = MetricClaim {
                field_path: field_path.to_string(),
                kind: MetricKind::Percentage,
                text: whole.as_str().to_string(),
                value,
            };
            if !self.is_level_percentage(text, whole.start(), whole.end()) {
                let band = self.bands.percent;
                if !band.contains(value) {
                    report.flags.push(flag(&claim, band, "percentage improvement"));
                }
            }
            report.claims.push(claim);
        }

        for re in &self.team {
            for caps in re.captures_iter(text) {
                let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if claimed.contains(&number.start()) {
                    continue;
                }
                let Ok(value) = number.as_str().parse::<f64>() else {
                    continue;
                };
                claimed.push(number.start());
                let claim = MetricClaim {
                    field_path: field_path.to_string(),
                    kind: MetricKind::TeamSize,
                    text: whole.as_str().to_string(),
                    value,
                };
                let band = self.bands.team_size(seniority);
                if !band.contains(value) {
                    let context = format!("team size for a {seniority} role");
                    report.flags.push(flag(&claim, band, &context));
                }
                report.claims.push(claim);
            }
        }

        for caps in self.currency.captures_iter(text) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let Some(value) = currency_value(number.as_str(), caps.get(3).map(|m| m.as_str()))
            else {
                continue;
            };
            report.claims.push(MetricClaim {
                field_path: field_path.to_string(),
                kind: MetricKind::Currency,
                text: whole.as_str().trim_end().to_string(),
                value,
            });
        }

        report
    }

    /// True when a level word is attached to this percentage on either side.
    /// Word-only gaps keep a level word from reaching across another number.
    fn is_level_percentage(&self, text: &str, start: usize, end: usize) -> bool {
        self.level_after.is_match(&text[end..]) || self.level_before.is_match(&text[..start])
    }
}

impl Default for MetricRealismChecker {
    fn default() -> Self {
        Self::new(MetricBands::default()).expect("metric patterns compile")
    }
}

fn flag(claim: &MetricClaim, band: Band, what: &str) -> MetricFlag {
    MetricFlag {
        field_path: claim.field_path.clone(),
        kind: claim.kind,
        text: claim.text.clone(),
        value: claim.value,
        band,
        detail: format!(
            "{} is outside the plausible {what} range {}-{}",
            claim.text, band.min, band.max
        ),
    }
}

fn currency_value(number: &str, suffix: Option<&str>) -> Option<f64> {
    // "1,200,000" groups vs "1,5" decimal: a comma followed by exactly three digits is grouping.
    let normalized = if number.split(',').skip(1).all(|g| g.len() == 3) {
        number.replace(',', "")
    } else {
        number.replace(',', ".")
    };
    let base: f64 = normalized.parse().ok()?;
    let multiplier = match suffix.map(str::to_lowercase).as_deref() {
        Some("k") | Some("thousand") => 1e3,
        Some("m") | Some("million") => 1e6,
        Some("b") | Some("bn") | Some("billion") => 1e9,
        _ => 1.0,
    };
    Some(base * multiplier)
}
