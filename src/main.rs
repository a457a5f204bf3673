use std::sync::Arc;
use ticker_api::client::TickerApi;
use tickerdesk::gateway::Gateway;
use tickerdesk::settings::EngineSettings;
use tickerdesk::sync::engine::Engine;
use tickerdesk::sync::fetcher::GatewayWorker;
use tickerdesk::sync::messages::{Command, GatewayEvent, GatewayJob, TimerEvent};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = EngineSettings::load();
    let api: Arc<dyn Gateway> = Arc::new(TickerApi::new(
        settings.api_base.clone(),
        settings.ingest_base.clone(),
    ));

    let (jobs_tx, jobs_rx) = mpsc::channel::<GatewayJob>(100);
    let (events_tx, events_rx) = mpsc::channel::<GatewayEvent>(100);
    let (timers_tx, timers_rx) = mpsc::channel::<TimerEvent>(100);
    let (commands_tx, commands_rx) = mpsc::channel::<Command>(100);

    let worker = GatewayWorker::new(api, settings.user_id, jobs_rx, events_tx);
    let worker_task = tokio::spawn(worker.run());

    let engine = Engine::new(jobs_tx, timers_tx, settings);
    let engine_task = tokio::spawn(engine.run(commands_rx, events_rx, timers_rx));

    commands_tx.send(Command::Start).await?;
    info!("engine running, ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    let _ = commands_tx.send(Command::Shutdown).await;
    if let Err(e) = engine_task.await {
        error!("engine task failed: {e}");
    }
    worker_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("tickerdesk {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "tickerdesk - live-ticker synchronization engine

Usage:
  tickerdesk
  tickerdesk --help
  tickerdesk --version

Environment:
  TICKERDESK_API_BASE      Ticker backend base URL (default http://127.0.0.1:8000/api/v1)
  TICKERDESK_INGEST_BASE   Ingestion webhook base URL (default http://127.0.0.1:5678/webhook)
  TICKERDESK_USER_ID       Favorites owner id (default 1)
  RUST_LOG                 Log filter (default info)"
}
