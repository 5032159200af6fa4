use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use super::input::read_input;
use super::{Host, ProgressReporter};
use crate::Result;
use crate::collector::{Collector, FailurePolicy, Registry};
use crate::scoring::WeightedScorer;
use crate::sources::{DEFAULT_GITHUB_API_URL, GithubClient, GithubMentionsSource, GithubRepoSource};
use crate::worker::{
    CheckpointStore, CollectWorker, Destination, FsDestination, JobSummary, NoProgress, Progress, ShardWorker, WorkLoop, WorkerStats,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use clap::Args;
use core::num::NonZeroUsize;
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, app_err};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const LOG_TARGET: &str = "   collect";

const PRIMARY_EXTENSION: &str = "csv";
const RAW_EXTENSION: &str = "json";

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Files listing one repository URL per line (`-` reads standard input)
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<Utf8PathBuf>,

    /// Path to configuration file (default is `collect_signals.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Checkpoint file used to resume an interrupted job
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<Utf8PathBuf>,

    /// Directory receiving the CSV shards
    #[arg(long, value_name = "PATH", help_heading = "Output")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Directory receiving the raw JSON-lines shards
    #[arg(long, value_name = "PATH", help_heading = "Output")]
    pub raw_output_dir: Option<Utf8PathBuf>,

    /// Number of repositories per shard
    #[arg(long, value_name = "COUNT")]
    pub shard_size: Option<usize>,

    /// Number of repositories of a shard collected at the same time
    #[arg(long, value_name = "COUNT")]
    pub concurrency: Option<usize>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,

    /// Substitute empty signals when a source fails instead of failing the repository
    #[arg(long)]
    pub lenient: bool,

    /// Do not append a score column
    #[arg(long, help_heading = "Scoring")]
    pub scoring_disable: bool,

    /// Name of the score column (default is the scorer name)
    #[arg(long, value_name = "NAME", help_heading = "Scoring")]
    pub scoring_column: Option<String>,

    /// Job time (RFC 3339) to use when no checkpoint exists, to write into an earlier job's output
    #[arg(long, value_name = "TIME", value_parser = parse_job_time)]
    pub job_time: Option<DateTime<Utc>>,

    /// Forget the attempts an earlier run spent on the resumed shard
    #[arg(long)]
    pub reset_attempts: bool,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

fn parse_job_time(s: &str) -> core::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("'{s}' is not an RFC 3339 timestamp: {e}"))
}

/// Run one collection job and report its outcome through `host`.
///
/// # Errors
///
/// Returns the error that terminated the job, after printing it to the host's error stream
pub async fn process_collect<H: Host>(host: &mut H, args: &CollectArgs, cancel: &CancellationToken) -> Result<()> {
    init_logging(args.log_level);

    match collect(args, cancel).await {
        Ok((summary, stats)) => {
            let _ = writeln!(
                host.output(),
                "Job {}: {} shard(s), {} repositories collected, {} skipped as uncollectable ({} restored, {} already present)",
                summary.job_time.to_rfc3339(),
                summary.shard_count,
                stats.collected,
                stats.uncollectable,
                summary.restored_shards,
                summary.existing_shards,
            );
            Ok(())
        }

        Err(e) => {
            let _ = writeln!(host.error(), "❌ Signal collection failed: {e:#}");
            host.exit(1);
            Err(e)
        }
    }
}

async fn collect(args: &CollectArgs, cancel: &CancellationToken) -> Result<(JobSummary, WorkerStats)> {
    let config = effective_config(args)?;
    log::debug!(target: LOG_TARGET, "Using configuration: {config:?}");

    let shard_size = NonZeroUsize::new(config.shard_size).ok_or_else(|| app_err!("shard_size must be greater than 0"))?;
    let concurrency = NonZeroUsize::new(config.concurrency).ok_or_else(|| app_err!("concurrency must be greater than 0"))?;

    let client = GithubClient::new(args.github_token.as_deref(), args.github_api_url.as_str())?;
    let mut registry = Registry::new();
    registry
        .register(GithubRepoSource::new(client.clone(), Utc::now()))
        .into_app_err("registering the repository source")?;
    registry
        .register(GithubMentionsSource::new(client))
        .into_app_err("registering the mentions source")?;

    let collector = Collector::new(Arc::new(registry), config.failure_policy);

    let primary: Arc<dyn Destination> = Arc::new(FsDestination::new(config.output_dir.as_std_path(), PRIMARY_EXTENSION));
    let raw: Arc<dyn Destination> = Arc::new(FsDestination::new(config.raw_output_dir.as_std_path(), RAW_EXTENSION));

    let mut worker = CollectWorker::new(collector, Arc::clone(&primary), Arc::clone(&raw)).with_concurrency(concurrency);
    if config.scoring.enabled {
        let scorer = WeightedScorer::from_config(&config.scoring)?;
        worker = worker.with_scorer(Arc::new(scorer), config.scoring.column_name());
    }
    let worker = Arc::new(worker);
    let shard_worker = Arc::clone(&worker) as Arc<dyn ShardWorker>;

    let progress: Arc<dyn Progress> = if args.log_level == LogLevel::None {
        Arc::new(ProgressReporter::new(Duration::from_millis(300), args.color.use_colors()))
    } else {
        Arc::new(NoProgress)
    };

    let store = CheckpointStore::open(config.state_file.as_std_path()).await?;
    let work_loop = WorkLoop::new(shard_worker, store, primary, raw, shard_size)
        .with_max_attempts(config.max_attempts)
        .with_job_time(args.job_time)
        .with_reset_attempts(args.reset_attempts)
        .with_progress(progress);

    let input = read_input(&args.inputs)?;
    let summary = work_loop.run(input, cancel).await?;

    Ok((summary, worker.stats()))
}

fn effective_config(args: &CollectArgs) -> Result<Config> {
    let mut config = Config::load(Utf8Path::new("."), args.config.as_deref())?;

    if let Some(state_file) = &args.state_file {
        config.state_file.clone_from(state_file);
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if let Some(raw_output_dir) = &args.raw_output_dir {
        config.raw_output_dir.clone_from(raw_output_dir);
    }
    if let Some(shard_size) = args.shard_size {
        config.shard_size = shard_size;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.lenient {
        config.failure_policy = FailurePolicy::Lenient;
    }
    if args.scoring_disable {
        config.scoring.enabled = false;
    }
    if let Some(column) = &args.scoring_column {
        config.scoring.column = Some(column.as_str().into());
    }

    config.validate().map_err(|e| e.enrich("invalid settings"))?;
    Ok(config)
}
