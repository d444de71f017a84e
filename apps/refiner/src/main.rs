use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use refiner::config::Config;
use refiner::guard::PhraseSanitizer;
use refiner::llm_client::{self, LlmClient};
use refiner::models::{JobContext, ResumeDocument};
use refiner::pipeline::{
    CompanionKind, CompanionWriter, LlmGenerator, RefinementPipeline, RefinementRequest,
};
use refiner::policy::{PolicyTable, TruthfulnessPolicy};

#[derive(Parser)]
#[command(name = "refiner", version, about = "Refine a resume against a job description")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the refinement pipeline and write the stage report as JSON
    Refine {
        /// Resume document (JSON)
        #[arg(long)]
        resume: PathBuf,

        /// Job context (JSON)
        #[arg(long)]
        job: PathBuf,

        /// Refinement mode: nudge | keywords | full | custom
        #[arg(long, default_value = "keywords")]
        mode: String,

        /// Output language tag
        #[arg(long, default_value = "en")]
        language: String,

        /// Keywords to inject, comma-separated
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write a cover letter, outreach message or application title
    Companion {
        /// Which text to write
        #[arg(value_enum)]
        kind: CompanionKind,

        /// Resume document (JSON), usually a refined one
        #[arg(long)]
        resume: PathBuf,

        /// Job context (JSON)
        #[arg(long)]
        job: PathBuf,

        /// Output language tag
        #[arg(long, default_value = "en")]
        language: String,

        /// Write the result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting refiner v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.pipeline_settings();
    let llm = LlmClient::new(config.anthropic_api_key.clone(), settings.timeout);
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator = Arc::new(LlmGenerator::new(llm));

    match cli.command {
        Command::Refine {
            resume,
            job,
            mode,
            language,
            keywords,
            output,
        } => {
            let policy = TruthfulnessPolicy::new(PolicyTable::with_elaboration_threshold(
                config.elaboration_threshold,
            ));
            let pipeline = RefinementPipeline::new(generator, policy, settings);
            let report = pipeline
                .run(RefinementRequest {
                    original: read_json::<ResumeDocument>(&resume)?,
                    job: read_json::<JobContext>(&job)?,
                    mode,
                    output_language: language,
                    keywords,
                })
                .await?;
            write_json(&report, output.as_deref())
        }
        Command::Companion {
            kind,
            resume,
            job,
            language,
            output,
        } => {
            let writer = CompanionWriter::new(generator, PhraseSanitizer::default(), settings);
            let text = writer
                .write(
                    kind,
                    &read_json::<ResumeDocument>(&resume)?,
                    &read_json::<JobContext>(&job)?,
                    &language,
                )
                .await?;
            write_json(&text, output.as_deref())
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
