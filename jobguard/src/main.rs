//! Jobguard - keep a CI job from running alongside conflicting pipelines
//!
//! Every option can also be supplied through the environment; inside a GitLab
//! job the API URL, project and pipeline id are picked up automatically.
//!
//! ## Exit status
//!
//! - `0`: no conflicting pipelines, safe to proceed
//! - `7`: conflicts found and `--no-wait` was given
//! - `11`: the timeout elapsed while conflicts remained
//! - `1`: invalid configuration

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, Level};

use jobguard::config::{
    AuthStyle, GuardConfig, DEFAULT_REF_PATTERN, DEFAULT_STATUS_PATTERN, DEFAULT_TIMEOUT_SECONDS,
};
use jobguard::events::LoggingEventSink;
use jobguard::guard::JobGuard;
use jobguard::lister::GitLabLister;
use jobguard::observability::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "jobguard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Guard CI jobs from running while other pipelines are active", long_about = None)]
struct Cli {
    /// Regex searched for in the ref of other pipelines
    #[arg(
        short = 'c',
        long = "check",
        visible_alias = "guard",
        env = "GUARD_REF_REGEX",
        default_value = DEFAULT_REF_PATTERN
    )]
    ref_pattern: String,

    /// Regex matched against the start of other pipelines' status
    #[arg(short = 's', long, env = "GUARD_STATUS_REGEX", default_value = DEFAULT_STATUS_PATTERN)]
    status_regex: String,

    /// GitLab API v4 base URL
    #[arg(short = 'u', long, env = "CI_API_V4_URL")]
    api_url: String,

    /// Project id or URL-encoded path
    #[arg(short = 'p', long, env = "CI_PROJECT_ID")]
    project_id: String,

    /// Id of the pipeline running this guard
    #[arg(short = 'i', long, env = "CI_PIPELINE_ID")]
    pipeline_id: u64,

    /// API access token
    #[arg(
        short = 't',
        long,
        visible_alias = "api-token",
        env = "PRIVATE_TOKEN",
        hide_env_values = true
    )]
    access_token: String,

    /// How the access token is sent: private-token or bearer
    #[arg(long, env = "GUARD_AUTH_STYLE", default_value_t = AuthStyle::PrivateToken)]
    auth_style: AuthStyle,

    /// Give up after this many seconds
    #[arg(short = 'w', long, env = "GUARD_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    timeout: u64,

    /// Suppress conflict summaries and progress markers
    #[arg(short = 'q', long = "quiet", visible_alias = "silent")]
    quiet: bool,

    /// Exit immediately when conflicts are found instead of waiting
    #[arg(short = 'x', long = "no-wait", visible_alias = "exit")]
    no_wait: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn guard_config(&self) -> Result<GuardConfig> {
        GuardConfig::builder()
            .with_ref_pattern(&self.ref_pattern)
            .with_status_pattern(&self.status_regex)
            .with_api_url(&self.api_url)
            .with_project_id(&self.project_id)
            .with_self_execution_id(self.pipeline_id)
            .with_credential(&self.access_token)
            .with_auth_style(self.auth_style)
            .with_timeout_seconds(self.timeout)
            .with_fail_fast(self.no_wait)
            .with_quiet(self.quiet)
            .build()
            .context("Invalid guard configuration")
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let config = cli.guard_config()?;
    debug!(config = ?config, "Resolved guard configuration");

    let lister = GitLabLister::from_config(&config).context("Failed to create API client")?;
    let sink = LoggingEventSink::new(config.quiet());

    let outcome = JobGuard::new(config, lister, &sink).run().await;
    Ok(ExitCode::from(outcome.exit_code()))
}
