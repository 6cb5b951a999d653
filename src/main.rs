use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::Mutex;

use incident_triage::config::{AnalyzeArgs, Cli, Command, Settings};
use incident_triage::relay::{alert_message, sms_gateway_address, Carrier, RelayClient};
use incident_triage::server::{self, AppState};
use incident_triage::{report, AnalysisStatus, Analyzer, GeminiClient, Session, VideoSource};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;

    let client = Arc::new(GeminiClient::new(
        &settings.api_key,
        &settings.model,
        &settings.api_base,
    )?);
    let analyzer = Arc::new(Analyzer::new(client, settings.timeout));
    let relay = match settings.relay_url.as_deref() {
        Some(url) => Some(Arc::new(RelayClient::new(url)?)),
        None => None,
    };

    log::info!("Using model {} at {}", settings.model, settings.api_base);

    match cli.command {
        Command::Analyze(args) => run_analyze(args, &analyzer, relay.as_deref()).await,
        Command::Serve(args) => {
            let state = AppState {
                session: Session::shared(),
                analyzer,
                relay,
                upload_dir: args.upload_dir,
            };
            server::serve(state, args.port).await
        }
    }
}

async fn run_analyze(
    args: AnalyzeArgs,
    analyzer: &Analyzer,
    relay: Option<&RelayClient>,
) -> Result<()> {
    let recipient = match (&args.notify_to, args.carrier.as_deref()) {
        (Some(_), _) if relay.is_none() => bail!("--notify-to needs --relay-url or RELAY_URL"),
        (Some(number), Some(carrier)) => {
            let carrier: Carrier = carrier.parse()?;
            Some(sms_gateway_address(number, carrier)?)
        }
        (Some(address), None) => Some(address.clone()),
        (None, _) => None,
    };

    // Validation failures stop here, before anything is read or sent
    let source = VideoSource::from_path(&args.video, args.mime_type.as_deref()).await?;

    let session = Mutex::new(Session::new());
    session.lock().await.select_video(source);
    analyzer.analyze(&session).await?;
    let session = session.into_inner();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    } else {
        print!("{}", report::render(&session));
    }

    if let (Some(to), Some(relay)) = (recipient, relay) {
        match session.active_alert() {
            Some(alert) => {
                let receipt = relay.send(&alert_message(&to, alert.incident)).await?;
                println!(
                    "Alert forwarded to {} (message id: {})",
                    receipt.recipient.as_deref().unwrap_or(&to),
                    receipt.message_id.as_deref().unwrap_or("n/a")
                );
            }
            None => log::info!("No alert raised, nothing forwarded"),
        }
    }

    if session.status() == AnalysisStatus::Error {
        bail!("analysis of {} failed", args.video.display());
    }
    Ok(())
}
