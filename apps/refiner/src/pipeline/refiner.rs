use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::RefineError;
use crate::guard::{
    CheckKind, GuardStatus, InvariantChecker, MetricFlag, MetricRealismChecker, PhraseSanitizer,
    Violation,
};
use crate::models::{JobContext, ResumeDocument};
use crate::pipeline::generator::{invoke, Expects, GenerationRequest, Generated, Generator};
use crate::pipeline::prompts::{
    INJECTION_RULES_EVIDENCE_ONLY, INJECTION_RULES_OPEN, KEYWORD_INJECTION_PROMPT,
    METRIC_VERIFICATION_PROMPT, VALIDATION_POLISH_PROMPT,
};
use crate::pipeline::stages::{Stage, StageOutcome, StageStatus};
use crate::policy::prompts::{language_name, RESUME_SCHEMA_EXAMPLE};
use crate::policy::{Policy, RefinementMode, TruthfulnessPolicy};

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Per-call bounds for generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub timeout: Duration,
    /// Retries after the first attempt, per stage.
    pub max_retries: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefinementRequest {
    pub original: ResumeDocument,
    pub job: JobContext,
    /// Mode name; resolved before any generation call.
    pub mode: String,
    /// Language tag, e.g. `en` or `pt-BR`.
    pub output_language: String,
    /// Explicit keywords. When present a keyword-injection stage runs.
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinementReport {
    pub run_id: Uuid,
    pub mode: RefinementMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub document: ResumeDocument,
    /// Repairs made to the input before the first stage.
    pub input_repairs: Vec<Violation>,
    pub outcomes: Vec<StageOutcome>,
}

impl RefinementReport {
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }
}

/// Everything a stage needs besides the working document.
struct RunContext {
    policy: Policy,
    job: JobContext,
    language: &'static str,
    keywords: Vec<String>,
    /// The sanitized original: source of truth for polish and injection prompts.
    master: ResumeDocument,
}

/// Runs the staged refinement. Holds only immutable tables and a shared
/// generator, so one pipeline serves any number of concurrent runs.
#[derive(Clone)]
pub struct RefinementPipeline {
    generator: Arc<dyn Generator>,
    policy: TruthfulnessPolicy,
    sanitizer: PhraseSanitizer,
    checker: InvariantChecker,
    metrics: MetricRealismChecker,
    settings: PipelineSettings,
}

impl RefinementPipeline {
    pub fn new(generator: Arc<dyn Generator>, policy: TruthfulnessPolicy, settings: PipelineSettings) -> Self {
        Self {
            generator,
            policy,
            sanitizer: PhraseSanitizer::default(),
            checker: InvariantChecker::default(),
            metrics: MetricRealismChecker::default(),
            settings,
        }
    }

    /// Replaces the default guard tables.
    pub fn with_guards(
        mut self,
        sanitizer: PhraseSanitizer,
        checker: InvariantChecker,
        metrics: MetricRealismChecker,
    ) -> Self {
        self.sanitizer = sanitizer;
        self.checker = checker;
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Runs every stage. Only an unknown mode fails the run; stage failures
    /// revert to the pre-stage document and are recorded on the outcomes.
    pub async fn run(&self, request: RefinementRequest) -> Result<RefinementReport, RefineError> {
        let policy = self.policy.policy_for(&request.mode)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Refinement run {} started: mode={} ({})",
            run_id,
            policy.mode,
            policy.mode.description()
        );

        let (original, input_repairs) = self.presanitize(request.original);

        let keywords = match &request.keywords {
            Some(explicit) => explicit
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            None => request.job.emphasis_keywords(),
        };
        let run_injection = request
            .keywords
            .as_ref()
            .is_some_and(|k| k.iter().any(|k| !k.trim().is_empty()));

        let ctx = RunContext {
            policy,
            job: request.job,
            language: language_name(&request.output_language),
            keywords,
            master: original.clone(),
        };

        let mut current = original;
        let mut outcomes = Vec::new();

        let (next, outcome) = self.run_stage(Stage::Tailor, &ctx, current, &[]).await;
        current = next;
        outcomes.push(outcome);

        if run_injection {
            let (next, outcome) = self.run_stage(Stage::KeywordInjection, &ctx, current, &[]).await;
            current = next;
            outcomes.push(outcome);
        }

        let flagged: Vec<MetricFlag> = self
            .metrics
            .check(&current, ctx.job.seniority_level)
            .flags;
        let envelope = &ctx.policy.envelope;
        if envelope.allow_fabricated_metrics || (envelope.allow_metric_revision && !flagged.is_empty()) {
            let (next, outcome) = self
                .run_stage(Stage::MetricVerification, &ctx, current, &flagged)
                .await;
            current = next;
            outcomes.push(outcome);
        } else if !flagged.is_empty() {
            debug!(
                "{} metric flags kept as warnings (mode {} may not revise metrics)",
                flagged.len(),
                ctx.policy.mode
            );
        }

        let (next, outcome) = self.run_stage(Stage::ValidationPolish, &ctx, current, &[]).await;
        current = next;
        outcomes.push(outcome);

        let reverted = outcomes.iter().filter(|o| o.is_reverted()).count();
        info!(
            "Refinement run {} finished: {} stages, {} reverted",
            run_id,
            outcomes.len(),
            reverted
        );

        Ok(RefinementReport {
            run_id,
            mode: ctx.policy.mode,
            started_at,
            finished_at: Utc::now(),
            document: current,
            input_repairs,
            outcomes,
        })
    }

    /// Section filter, phrase sanitizer and id normalization over the untouched
    /// input, so even a run where every stage reverts returns clean output.
    fn presanitize(&self, mut doc: ResumeDocument) -> (ResumeDocument, Vec<Violation>) {
        let mut repairs = Vec::new();
        for path in self.checker.section_filter().filter_in_place(&mut doc) {
            info!("Removed blacklisted section {}", path);
            repairs.push(Violation {
                check: CheckKind::BannedSection,
                field_path: path,
                detail: "blacklisted section removed".to_string(),
                repaired: true,
            });
        }
        let hits = self.sanitizer.sanitize_document(&mut doc);
        if !hits.is_empty() {
            debug!("Sanitized {} phrases in the input document", hits.len());
        }
        doc.additional.dedup_skills();

        for (old, new) in doc.normalize_ids() {
            warn!("Input entry {} has a zero or duplicate id; renumbered to {}", old, new);
            repairs.push(Violation {
                check: CheckKind::Shape,
                field_path: old,
                detail: format!("zero or duplicate id; renumbered to {new}"),
                repaired: true,
            });
        }
        (doc, repairs)
    }

    /// Runs one stage with its retry budget. Returns the next working document
    /// (the candidate if accepted or repaired, else `current` unchanged).
    async fn run_stage(
        &self,
        stage: Stage,
        ctx: &RunContext,
        current: ResumeDocument,
        flagged: &[MetricFlag],
    ) -> (ResumeDocument, StageOutcome) {
        info!("Stage {} started", stage);

        let request = match self.build_request(stage, ctx, &current, flagged) {
            Ok(request) => request,
            Err(e) => {
                warn!("Stage {} could not be prepared: {}", stage, e);
                let error = format!("{}: {}", e.code(), e);
                return (current, StageOutcome::reverted(stage, 0, Vec::new(), error));
            }
        };

        let max_attempts = self.settings.max_retries + 1;
        let mut last_error: Option<RefineError> = None;
        let mut last_violations: Vec<Violation> = Vec::new();

        for attempt in 1..=max_attempts {
            let candidate = match invoke(self.generator.as_ref(), &request, self.settings.timeout).await {
                Ok(Generated::Document(doc)) => doc,
                Ok(Generated::Text(_)) => {
                    let err = RefineError::MalformedOutput("expected a resume document, got free text".into());
                    warn!("Stage {} attempt {}/{}: {}", stage, attempt, max_attempts, err);
                    last_error = Some(err);
                    continue;
                }
                Err(err) => {
                    warn!("Stage {} attempt {}/{}: {}", stage, attempt, max_attempts, err);
                    last_error = Some(err);
                    continue;
                }
            };

            let guard = self.checker.check(&current, candidate, &ctx.policy.envelope);
            if guard.status == GuardStatus::Rejected {
                let detail = guard
                    .irrecoverable()
                    .map(|v| format!("{}: {}", v.field_path, v.detail))
                    .collect::<Vec<_>>()
                    .join("; ");
                let err = RefineError::IrrecoverableInvariantViolation(detail);
                warn!("Stage {} attempt {}/{}: {}", stage, attempt, max_attempts, err);
                last_error = Some(err);
                last_violations = guard.violations;
                continue;
            }

            let mut document = guard.document;
            let sanitized = self.sanitizer.sanitize_document(&mut document);
            let warnings = self.metrics.check(&document, ctx.job.seniority_level).flags;

            for v in &guard.violations {
                debug!("Stage {} repaired {} ({:?}): {}", stage, v.field_path, v.check, v.detail);
            }

            let status = if guard.status == GuardStatus::Accepted && sanitized.is_empty() {
                StageStatus::Accepted
            } else {
                StageStatus::Repaired
            };
            info!(
                "Stage {} {:?} after {} attempt(s): {} repairs, {} phrases, {} metric warnings",
                stage,
                status,
                attempt,
                guard.violations.len(),
                sanitized.len(),
                warnings.len()
            );

            return (
                document,
                StageOutcome {
                    stage,
                    status,
                    attempts: attempt,
                    violations: guard.violations,
                    warnings,
                    sanitized,
                    error: None,
                },
            );
        }

        let error = last_error
            .map(|e| format!("{}: {}", e.code(), e))
            .unwrap_or_else(|| "no generation attempt was made".to_string());
        warn!("Stage {} rejected after {} attempts, reverting: {}", stage, max_attempts, error);
        (
            current,
            StageOutcome::reverted(stage, max_attempts, last_violations, error),
        )
    }

    fn build_request(
        &self,
        stage: Stage,
        ctx: &RunContext,
        current: &ResumeDocument,
        flagged: &[MetricFlag],
    ) -> Result<GenerationRequest, RefineError> {
        let resume_json = to_json(current)?;
        let job_description = job_description_text(&ctx.job)?;
        let rules = ctx.policy.rules.as_str();

        let instructions = match stage {
            Stage::Tailor => ctx
                .policy
                .instructions
                .replace("{output_language}", ctx.language)
                .replace("{job_description}", &job_description)
                .replace("{job_keywords}", &ctx.keywords.join(", "))
                .replace("{original_resume}", &resume_json)
                .replace("{schema}", RESUME_SCHEMA_EXAMPLE),
            Stage::KeywordInjection => {
                let injection_rules = if ctx.policy.envelope.allow_new_skills {
                    INJECTION_RULES_OPEN
                } else {
                    INJECTION_RULES_EVIDENCE_ONLY
                };
                KEYWORD_INJECTION_PROMPT
                    .replace("{truthfulness_rules}", rules)
                    .replace("{injection_rules}", injection_rules)
                    .replace("{keywords_to_inject}", &missing_keywords(current, &ctx.keywords).join(", "))
                    .replace("{current_resume}", &resume_json)
                    .replace("{master_resume}", &to_json(&ctx.master)?)
                    .replace("{job_description}", &job_description)
                    .replace("{output_language}", ctx.language)
            }
            Stage::MetricVerification => {
                let band = self.metrics.bands().team_size(ctx.job.seniority_level);
                METRIC_VERIFICATION_PROMPT
                    .replace("{truthfulness_rules}", rules)
                    .replace("{seniority_level}", ctx.job.seniority_level.as_str())
                    .replace("{team_band}", &format!("{} and {}", band.min, band.max))
                    .replace("{flagged_metrics}", &render_flags(flagged))
                    .replace("{resume}", &resume_json)
                    .replace("{job_description}", &job_description)
            }
            Stage::ValidationPolish => VALIDATION_POLISH_PROMPT
                .replace("{truthfulness_rules}", rules)
                .replace("{output_language}", ctx.language)
                .replace("{resume}", &resume_json)
                .replace("{master_resume}", &to_json(&ctx.master)?),
        };

        Ok(GenerationRequest {
            stage: stage.as_str().to_string(),
            instructions,
            document: current.clone(),
            job: ctx.job.clone(),
            output_language: ctx.language.to_string(),
            expects: Expects::Document,
        })
    }
}

fn to_json(doc: &ResumeDocument) -> Result<String, RefineError> {
    Ok(serde_json::to_string_pretty(doc).context("Failed to serialize resume document")?)
}

/// Raw description when present, otherwise the structured requirements.
fn job_description_text(job: &JobContext) -> Result<String, RefineError> {
    if !job.job_description.trim().is_empty() {
        return Ok(job.job_description.clone());
    }
    Ok(serde_json::to_string_pretty(job).context("Failed to serialize job context")?)
}

/// Keywords not yet mentioned anywhere in the document. Falls back to the full
/// list when every keyword already appears.
fn missing_keywords(doc: &ResumeDocument, keywords: &[String]) -> Vec<String> {
    let mut haystack: String = doc
        .texts()
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n");
    haystack.push('\n');
    haystack.push_str(&doc.additional.technical_skills.join("\n"));
    let haystack = haystack.to_lowercase();

    let missing: Vec<String> = keywords
        .iter()
        .filter(|k| !haystack.contains(&k.to_lowercase()))
        .cloned()
        .collect();
    if missing.is_empty() {
        keywords.to_vec()
    } else {
        missing
    }
}

fn render_flags(flags: &[MetricFlag]) -> String {
    if flags.is_empty() {
        return "None flagged.".to_string();
    }
    flags
        .iter()
        .map(|f| format!("- {}: {}", f.field_path, f.detail))
        .collect::<Vec<_>>()
        .join("\n")
}
