//! `completion-sync` binary: sync every built-in completion source once.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use completion_sync::{Config, Syncer, TaskList, run_with_shutdown};
use tracing_subscriber::EnvFilter;

/// Arguments for `completion-sync`
#[derive(Parser, Debug)]
#[command(
    name = "completion-sync",
    version,
    about = "Fetch zsh completion scripts for third-party CLI tools",
    after_help = "\
Examples:
  completion-sync
  completion-sync -o ~/.zsh/completions -j 4
  completion-sync --list"
)]
struct Cli {
    /// Directory that receives the completion files
    #[arg(short, long, value_name = "DIR", env = "COMPLETION_SYNC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum number of tasks running at once (default: number of CPUs)
    #[arg(short, long, env = "COMPLETION_SYNC_JOBS")]
    jobs: Option<usize>,

    /// Base URL of the release API
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Base URL release assets are downloaded from
    #[arg(long, value_name = "URL")]
    download_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Print the task list and exit
    #[arg(long)]
    list: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(jobs) = self.jobs {
            config.max_concurrent_tasks = jobs;
        }
        if let Some(url) = self.api_url {
            config.api_base_url = url;
        }
        if let Some(url) = self.download_url {
            config.download_base_url = url;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let tasks = TaskList::builtin();
    if cli.list {
        for task in tasks.tasks() {
            println!("{:<8} {task}", task.kind());
        }
        return ExitCode::SUCCESS;
    }

    let syncer = match Syncer::new(cli.into_config()) {
        Ok(syncer) => syncer,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    match run_with_shutdown(&syncer, &tasks).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "sync aborted");
            ExitCode::FAILURE
        }
    }
}
