use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{TriageError, TriageResult};
use crate::inference::{DEFAULT_API_BASE, DEFAULT_MODEL};

#[derive(Parser, Debug)]
#[command(name = "incident_triage")]
#[command(about = "Security video incident analysis with alert triage", long_about = None)]
pub struct Cli {
    /// API key for the inference service
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model used for analysis
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the inference API
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Give up on the inference call after this many seconds (no limit if unset)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Notification relay endpoint used to forward alerts
    #[arg(long, env = "RELAY_URL", global = true)]
    pub relay_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one video file and print the incidents
    Analyze(AnalyzeArgs),
    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Video file to analyze
    #[arg(value_name = "VIDEO")]
    pub video: PathBuf,

    /// Media type of the file (guessed from the extension if omitted)
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Print the session as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Forward the alert, if any, to this address (or phone number with --carrier)
    #[arg(long)]
    pub notify_to: Option<String>,

    /// Carrier for SMS gateway delivery (att, tmobile, verizon, sprint)
    #[arg(long, requires = "notify_to")]
    pub carrier: Option<String>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to serve on
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Directory uploaded videos are stored in
    #[arg(long, default_value = "uploads")]
    pub upload_dir: PathBuf,
}

/// Validated process settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
    pub relay_url: Option<String>,
}

impl Settings {
    /// Fails when no API key is configured; callers treat this as fatal
    pub fn from_cli(cli: &Cli) -> TriageResult<Self> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TriageError::Config("API_KEY environment variable not set".to_string())
            })?;

        if cli.timeout_secs == Some(0) {
            return Err(TriageError::Config(
                "--timeout-secs must be greater than zero".to_string(),
            ));
        }

        Ok(Settings {
            api_key: api_key.to_string(),
            model: cli.model.clone(),
            api_base: cli.api_base.clone(),
            timeout: cli.timeout_secs.map(Duration::from_secs),
            relay_url: cli.relay_url.clone().filter(|u| !u.trim().is_empty()),
        })
    }
}
