//! Command dispatch logic for collect-signals

use super::{CollectArgs, process_collect};
use crate::{Host, Result};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use tokio_util::sync::CancellationToken;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "collect-signals", version, author, long_about = None)]
#[command(about = "Collect health signals for a list of repositories, in resumable shards")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    args: CollectArgs,
}

/// Parse command-line arguments and run the collection job
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
/// * `cancel` - Cancelled to stop the job; progress made so far stays checkpointed
///
/// # Errors
///
/// Returns an error if the job fails or is cancelled
pub async fn run<I, T, H>(host: &mut H, args: I, cancel: &CancellationToken) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    process_collect(host, &cli.args, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_overrides() {
        let cli = Cli::try_parse_from([
            "collect-signals",
            "--shard-size",
            "3",
            "--lenient",
            "--job-time",
            "2024-01-02T03:04:05Z",
            "--scoring-column",
            "criticality",
            "a.txt",
            "-",
        ])
        .unwrap();

        assert_eq!(cli.args.inputs.len(), 2);
        assert_eq!(cli.args.shard_size, Some(3));
        assert!(cli.args.lenient);
        assert_eq!(cli.args.job_time.unwrap().to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert_eq!(cli.args.scoring_column.as_deref(), Some("criticality"));
    }

    #[test]
    fn test_requires_an_input() {
        let _ = Cli::try_parse_from(["collect-signals"]).unwrap_err();
    }

    #[test]
    fn test_rejects_bad_job_time() {
        let _ = Cli::try_parse_from(["collect-signals", "--job-time", "noon", "a.txt"]).unwrap_err();
    }
}
