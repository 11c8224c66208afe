//! prready-notify: announce a pull request ready for review on Slack.
//!
//! Meant to run as a CI step. Every message input comes from environment
//! variables (see `prready_core::config`); the flags here only control how
//! the run behaves.
//!
//! Exit status: 0 on success, 1 for missing or invalid configuration, 2 when
//! the message could not be delivered.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use prready_core::errors::{CoreError, NotificationError};
use prready_core::pipeline::{Delivery, RunOptions};
use prready_core::{EnvSource, Notifier, ProcessEnv};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Post a "ready for review" message to a Slack incoming webhook.
#[derive(Parser, Debug)]
#[command(
    name = "prready-notify",
    version,
    about = "Post a pull-request-ready message to a Slack incoming webhook"
)]
struct Cli {
    /// Print the JSON payload instead of sending it.
    #[arg(long)]
    dry_run: bool,

    /// TOML file with extra handle to Slack user id mappings.
    /// Overrides SLACK_USER_MAP.
    #[arg(long, value_name = "PATH")]
    user_map: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error. RUST_LOG takes precedence.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for the run report.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let code = execute(&cli, &ProcessEnv, &mut io::stdout(), &mut io::stderr()).await;
    ExitCode::from(code)
}

/// Run once and report: the run report goes to `out`, the failure line to
/// `err`. Returns the process exit status.
async fn execute(
    cli: &Cli,
    env: &impl EnvSource,
    out: &mut impl Write,
    err: &mut impl Write,
) -> u8 {
    match run(cli, env, out).await {
        Ok(()) => 0,
        Err(e) => {
            report_error(&e, err);
            e.exit_code()
        }
    }
}

// Output failures are ignored; a closed stdout must not change the exit status.
fn report_error(e: &CoreError, err: &mut impl Write) {
    let _ = match e {
        CoreError::Config(_) => writeln!(err, "{}", e),
        CoreError::Notification(_) => writeln!(err, "Error sending message: {}", e),
    };
}

async fn run(cli: &Cli, env: &impl EnvSource, out: &mut impl Write) -> Result<(), CoreError> {
    let options = RunOptions {
        dry_run: cli.dry_run,
        user_map: cli.user_map.clone(),
    };
    let notifier = Notifier::prepare(env, &options)?;

    if notifier.is_dry_run() {
        let json = serde_json::to_string_pretty(&notifier.notification.payload)
            .map_err(NotificationError::from)?;
        let _ = writeln!(out, "{}", json);
    } else {
        let _ = writeln!(out, "Sending message to {}", notifier.config.webhook_url);
        let _ = writeln!(out, "Message: {}", notifier.config.message);
    }

    if let Delivery::Sent(status) = notifier.execute().await? {
        debug!(status = %status, "webhook accepted message");
        let _ = writeln!(out, "{}", status);
    }
    Ok(())
}
