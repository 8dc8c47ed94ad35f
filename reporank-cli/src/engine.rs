//! Concurrent acquire-and-analyze orchestration.
//!
//! One batch run fans out one task per repository locator, joins them all,
//! and persists the surviving reports in a single batch write. Individual
//! repositories never fail a batch: a private repository, an unsupported
//! language, or an elapsed task budget all collapse into a skip.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use reporank_core::{
    AnalysisReport, Constraint, Preference, RepoRankError, Result, StaticAnalyzer,
    normalize_report,
};

use crate::store::BatchStore;

/// Fixed user-facing message when no submitted repository survives analysis.
pub const NO_ANALYZABLE_REPOSITORY: &str = "could not run the analysis: ensure that at least \
one repository is public and uses a supported language";

/// Tuning for one batch run.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Directory the per-request working areas are created under.
    pub workspace_root: PathBuf,
    /// Maximum number of concurrently running acquire+analyze tasks.
    pub concurrency: usize,
    /// Per-repository time budget; an elapsed task is skipped.
    pub task_timeout: Option<Duration>,
    /// Whole-batch deadline; an elapsed batch fails with a retryable error.
    pub deadline: Option<Duration>,
    /// Hosts repositories may be cloned from.
    pub allowed_hosts: Vec<String>,
    /// Whether plain local directories are accepted as locators.
    pub allow_local: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("reporank"),
            concurrency: 5,
            task_timeout: Some(Duration::from_secs(300)),
            deadline: Some(Duration::from_secs(1800)),
            allowed_hosts: vec!["github.com".to_string()],
            allow_local: false,
        }
    }
}

/// Scratch directory owned by one batch run.
///
/// [`WorkArea::remove`] surfaces cleanup failures on the success path; `Drop`
/// is the backstop for every other exit path.
struct WorkArea {
    path: PathBuf,
    cleaned: bool,
}

impl WorkArea {
    fn create(root: &Path) -> Result<Self> {
        let path = root.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&path).map_err(|err| {
            RepoRankError::Internal(format!(
                "failed to create working area {}: {err}",
                path.display()
            ))
        })?;
        Ok(Self {
            path,
            cleaned: false,
        })
    }

    fn scratch_dir(&self, index: usize) -> PathBuf {
        self.path.join(format!("repo-{index}"))
    }

    fn remove(mut self) -> Result<()> {
        self.cleaned = true;
        std::fs::remove_dir_all(&self.path).map_err(|err| {
            RepoRankError::Internal(format!(
                "failed to remove working area {}: {err}",
                self.path.display()
            ))
        })
    }
}

impl Drop for WorkArea {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            warn!(
                "failed to remove working area {}: {err}",
                self.path.display()
            );
        }
    }
}

/// Run one batch: fan out acquire+analyze per locator, join them all, and
/// persist the surviving reports exactly once.
///
/// Returns the stored batch id. The working area is removed on every exit
/// path, including failures.
pub async fn process_batch<S, B>(
    locators: &[String],
    owner: &str,
    constraints: &[Constraint],
    preferences: &[Preference],
    analyzer: Arc<S>,
    store: &B,
    options: &EngineOptions,
) -> Result<String>
where
    S: StaticAnalyzer + Send + Sync + 'static,
    B: BatchStore,
{
    if locators.is_empty() {
        return Err(RepoRankError::Validation(
            "at least one repository locator is required".to_string(),
        ));
    }
    for constraint in constraints {
        constraint.validate()?;
    }
    for preference in preferences {
        preference.validate()?;
    }

    let work_area = WorkArea::create(&options.workspace_root)?;
    info!(
        "processing {} repositories in {}",
        locators.len(),
        work_area.path.display()
    );

    let tasks = run_tasks(locators, analyzer, &work_area, options);
    let outcomes = match options.deadline {
        Some(deadline) => tokio::time::timeout(deadline, tasks).await.map_err(|_| {
            RepoRankError::Internal("batch deadline exceeded; retry later".to_string())
        })??,
        None => tasks.await?,
    };

    let reports: Vec<AnalysisReport> = outcomes.into_iter().flatten().collect();
    if reports.is_empty() {
        return Err(RepoRankError::Validation(
            NO_ANALYZABLE_REPOSITORY.to_string(),
        ));
    }
    info!(
        "collected {} of {} repositories",
        reports.len(),
        locators.len()
    );

    let batch_id = store.save_batch(owner, &reports, constraints, preferences)?;
    work_area.remove()?;
    Ok(batch_id)
}

async fn run_tasks<S>(
    locators: &[String],
    analyzer: Arc<S>,
    work_area: &WorkArea,
    options: &EngineOptions,
) -> Result<Vec<Option<AnalysisReport>>>
where
    S: StaticAnalyzer + Send + Sync + 'static,
{
    let concurrency = options.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for (index, locator) in locators.iter().enumerate() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| RepoRankError::Internal(format!("task scheduling failed: {err}")))?;
        let analyzer = analyzer.clone();
        let locator = locator.clone();
        let scratch = work_area.scratch_dir(index);
        let task_timeout = options.task_timeout;
        let settings = AcquireSettings {
            allowed_hosts: options.allowed_hosts.clone(),
            allow_local: options.allow_local,
        };
        tasks.spawn(async move {
            let _permit = permit;
            let work = acquire_and_analyze(&locator, &scratch, analyzer, &settings);
            match task_timeout {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("repository {locator} exceeded its time budget; skipping");
                        None
                    }
                },
                None => work.await,
            }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                // A crashed task skips its repository, never the batch.
                warn!("analysis task failed: {err}");
                outcomes.push(None);
            }
        }
    }
    Ok(outcomes)
}

async fn acquire_and_analyze<S>(
    locator: &str,
    scratch: &Path,
    analyzer: Arc<S>,
    settings: &AcquireSettings,
) -> Option<AnalysisReport>
where
    S: StaticAnalyzer + Send + Sync + 'static,
{
    let checkout = acquire_repository(locator, scratch, settings).await?;
    let task_locator = locator.to_string();
    let analysis =
        tokio::task::spawn_blocking(move || analyzer.analyze(&checkout, &task_locator)).await;

    let report = match analysis {
        Ok(Ok(report)) => report,
        Ok(Err(err)) => {
            warn!("analysis of {locator} failed: {err}; skipping");
            None
        }
        Err(err) => {
            warn!("analysis of {locator} crashed: {err}; skipping");
            None
        }
    };

    report.map(|mut report| {
        normalize_report(&mut report);
        report
    })
}

#[derive(Debug, Clone)]
struct AcquireSettings {
    allowed_hosts: Vec<String>,
    allow_local: bool,
}

/// Acquire the repository behind `locator` into `dest`.
///
/// Local directories are used in place when enabled; remote locators must
/// pass host validation and clone successfully. `None` always means skip.
async fn acquire_repository(
    locator: &str,
    dest: &Path,
    settings: &AcquireSettings,
) -> Option<PathBuf> {
    if settings.allow_local {
        let candidate = Path::new(locator);
        if candidate.is_dir() {
            return Some(candidate.to_path_buf());
        }
    }

    if !is_allowed_remote(locator, &settings.allowed_hosts) {
        warn!("locator {locator} is not on an allowed host; skipping");
        return None;
    }

    match clone_repository(locator, dest).await {
        Ok(true) => Some(dest.to_path_buf()),
        Ok(false) => {
            warn!("repository {locator} is private or unreachable; skipping");
            None
        }
        Err(err) => {
            warn!("could not clone {locator}: {err}; skipping");
            None
        }
    }
}

/// Whether a remote locator points at an allowed host.
///
/// The authority must carry no userinfo and the host must match an allowed
/// host exactly; `github.com@evil` and `github.com.malicious.com` lookalikes
/// fail both checks.
fn is_allowed_remote(locator: &str, allowed_hosts: &[String]) -> bool {
    let Some(rest) = locator.strip_prefix("https://") else {
        return false;
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    if authority.is_empty() || authority.contains('@') {
        return false;
    }
    let host = authority.split(':').next().unwrap_or(authority);
    allowed_hosts
        .iter()
        .any(|allowed| host.eq_ignore_ascii_case(allowed))
}

async fn clone_repository(url: &str, dest: &Path) -> std::io::Result<bool> {
    let status = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg(url)
        .arg(dest)
        // Never prompt for credentials; a private repository must skip, not hang.
        .env("GIT_TERMINAL_PROMPT", "0")
        .kill_on_drop(true)
        .status()
        .await?;
    Ok(status.success())
}
