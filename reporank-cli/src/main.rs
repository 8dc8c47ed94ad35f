#![deny(missing_docs)]
//! RepoRank command-line interface.
//!
//! `process` clones and analyzes a batch of repositories concurrently and
//! stores the resulting batch document; `assess` ranks a stored batch
//! against constraints and preferences.

mod engine;
mod store;

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use engine::EngineOptions;
use reporank_core::{
    AnalysisReport, Assessment, AssessmentService, Constraint, Preference, StdFileSystem,
    TokeiAnalyzer, format_language_stats, render_assessment_markdown, render_json,
};
use store::JsonBatchStore;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "reporank", version, about = "RepoRank CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(true)
        .args(&["file", "url", "path"])
))]
struct RepoSourceArgs {
    /// File containing repository URLs (one per line).
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Repository URL to analyze (repeatable).
    #[arg(long)]
    url: Vec<String>,
    /// Local repository path to analyze (repeatable, implies --allow-local).
    #[arg(long)]
    path: Vec<PathBuf>,
}

#[derive(Args, Clone)]
struct EngineArgs {
    /// Base directory for per-request scratch workspaces.
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// Maximum number of concurrent acquire+analyze tasks.
    #[arg(short = 'j', long, default_value_t = 5)]
    concurrency: usize,
    /// Per-repository time budget in seconds (0 disables it).
    #[arg(long, default_value_t = 300)]
    task_timeout: u64,
    /// Whole-batch deadline in seconds (0 disables it).
    #[arg(long, default_value_t = 1800)]
    deadline: u64,
    /// Host repositories may be cloned from (repeatable or comma-separated).
    #[arg(long = "allowed-host", value_delimiter = ',', default_value = "github.com")]
    allowed_hosts: Vec<String>,
    /// Permit plain local directory paths as locators.
    #[arg(long)]
    allow_local: bool,
}

#[derive(Args, Clone)]
struct AssessmentInputArgs {
    /// JSON file with constraints, e.g. [{"qualityMetric":"COMMENT_RATE","operator":">=","threshold":0.2}].
    #[arg(long)]
    constraints: Option<PathBuf>,
    /// JSON file with preferences, e.g. [{"qualityAttribute":"SIMPLICITY","weight":0.34}].
    #[arg(long)]
    preferences: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone and analyze repositories concurrently, storing one batch document.
    Process {
        #[command(flatten)]
        source: RepoSourceArgs,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        inputs: AssessmentInputArgs,
        /// Owner recorded on the stored batch.
        #[arg(long, env = "USER", default_value = "local")]
        owner: String,
        /// Directory batch documents are stored in.
        #[arg(long, default_value = "reporank-batches")]
        store_dir: PathBuf,
    },
    /// Rank a stored batch and split it by constraints.
    Assess {
        /// Batch document produced by `process`.
        #[arg(long)]
        batch: PathBuf,
        #[command(flatten)]
        inputs: AssessmentInputArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            source,
            engine,
            inputs,
            owner,
            store_dir,
        } => run_process(source, engine, inputs, owner, store_dir).await?,
        Commands::Assess {
            batch,
            inputs,
            report,
        } => run_assess(batch, inputs, report).await?,
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_process(
    source: RepoSourceArgs,
    engine_args: EngineArgs,
    inputs: AssessmentInputArgs,
    owner: String,
    store_dir: PathBuf,
) -> CliResult<()> {
    let locators = resolve_locators(&source).await?;
    let constraints = load_constraints(inputs.constraints.as_deref())?;
    let preferences = load_preferences(inputs.preferences.as_deref())?;
    let options = engine_options(&engine_args, !source.path.is_empty());

    let analyzer = Arc::new(TokeiAnalyzer::new(StdFileSystem::new()));
    let store = JsonBatchStore::new(&store_dir);
    let batch_id = engine::process_batch(
        &locators,
        &owner,
        &constraints,
        &preferences,
        analyzer,
        &store,
        &options,
    )
    .await?;

    println!(
        "Stored batch {batch_id} at {}",
        store.batch_path(&batch_id).display()
    );
    Ok(())
}

async fn run_assess(
    batch_path: PathBuf,
    inputs: AssessmentInputArgs,
    output: OutputArgs,
) -> CliResult<()> {
    let batch = JsonBatchStore::load_batch(&batch_path)?;
    let constraints = match inputs.constraints.as_deref() {
        Some(path) => load_constraints(Some(path))?,
        None => batch.constraints,
    };
    let preferences = match inputs.preferences.as_deref() {
        Some(path) => load_preferences(Some(path))?,
        None => batch.preferences,
    };

    let service = AssessmentService::new();
    let assessment = service.assess(batch.reports, &constraints, &preferences);
    emit_assessment(&assessment, &output).await
}

fn engine_options(args: &EngineArgs, has_local_paths: bool) -> EngineOptions {
    let defaults = EngineOptions::default();
    EngineOptions {
        workspace_root: args
            .workspace
            .clone()
            .unwrap_or(defaults.workspace_root),
        concurrency: args.concurrency,
        task_timeout: duration_from_secs(args.task_timeout),
        deadline: duration_from_secs(args.deadline),
        allowed_hosts: args.allowed_hosts.clone(),
        allow_local: args.allow_local || has_local_paths,
    }
}

fn duration_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

async fn resolve_locators(source: &RepoSourceArgs) -> CliResult<Vec<String>> {
    let mut locators = Vec::new();
    if let Some(file) = &source.file {
        locators.extend(load_repo_urls(file).await?);
    }
    for url in &source.url {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err("url cannot be empty".into());
        }
        locators.push(trimmed.to_string());
    }
    for path in &source.path {
        locators.push(path.display().to_string());
    }
    if locators.is_empty() {
        return Err("no repository locators provided".into());
    }
    Ok(locators)
}

async fn load_repo_urls(path: &Path) -> CliResult<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let urls = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    Ok(urls)
}

fn load_constraints(path: Option<&Path>) -> CliResult<Vec<Constraint>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents = std::fs::read_to_string(path)?;
    let constraints: Vec<Constraint> = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid constraints file {}: {err}", path.display()))?;
    for constraint in &constraints {
        constraint.validate()?;
    }
    Ok(constraints)
}

fn load_preferences(path: Option<&Path>) -> CliResult<Vec<Preference>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents = std::fs::read_to_string(path)?;
    let preferences: Vec<Preference> = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid preferences file {}: {err}", path.display()))?;
    for preference in &preferences {
        preference.validate()?;
    }
    Ok(preferences)
}

async fn emit_assessment(assessment: &Assessment, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_assessment_text(assessment),
        OutputFormat::Markdown => render_assessment_markdown(assessment),
        OutputFormat::Json => render_json(assessment)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_assessment_text(assessment: &Assessment) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Compliant repositories:");
    if assessment.compliant.is_empty() {
        let _ = writeln!(output, "- none");
    }
    for (position, report) in assessment.compliant.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} (rank {})",
            position + 1,
            report.project_url,
            format_rank(report)
        );
        append_languages(&mut output, report);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Non-compliant repositories:");
    if assessment.non_compliant.is_empty() {
        let _ = writeln!(output, "- none");
    }
    for report in &assessment.non_compliant {
        let _ = writeln!(
            output,
            "- {} (rank {})",
            report.project_url,
            format_rank(report)
        );
        append_languages(&mut output, report);
    }

    output
}

fn format_rank(report: &AnalysisReport) -> String {
    match report.rank {
        Some(rank) => format!("{rank:.4}"),
        None => "unranked".to_string(),
    }
}

fn append_languages(output: &mut String, report: &AnalysisReport) {
    if report.languages.is_empty() {
        return;
    }
    let languages: Vec<String> = format_language_stats(&report.languages)
        .into_iter()
        .map(|(language, percent)| format!("{language} {percent:.1}%"))
        .collect();
    let _ = writeln!(output, "   languages: {}", languages.join(", "));
}
