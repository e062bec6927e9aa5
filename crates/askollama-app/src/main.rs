use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use askollama_config::Config;
use askollama_host::{EventBus, EventSource, HttpHostClient, WsEventSource};
use clap::Parser;
use tokio::signal;

mod console;
mod controller;
mod logging;

use self::controller::AppController;

#[derive(Parser, Debug)]
#[command(name = "askollama", about = "Screenshot assistant overlay")]
struct Args {
    /// JSON config file; environment defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host command endpoint
    #[arg(long)]
    host_url: Option<String>,
    /// Host event WebSocket
    #[arg(long)]
    events_url: Option<String>,
    #[arg(long)]
    json_logs: bool,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };

    if let Some(url) = &args.host_url {
        config.host.command_url = url.clone();
    }
    if let Some(url) = &args.events_url {
        config.host.events_url = url.clone();
    }
    if args.json_logs {
        config.log.json = Some(true);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = load_config(&args)?;
    logging::init(&config.log)?;

    tracing::info!("Running in background. Take a screenshot to see results.");

    let host = Arc::new(HttpHostClient::new(config.host.command_url.clone()));
    tracing::info!("Host commands via {}", host.base_url());

    let channels = [
        config.host.ocr_channel.clone(),
        config.host.explanation_channel.clone(),
    ];
    let bridge = match WsEventSource::connect(&config.host.events_url, channels.clone()).await {
        Ok(source) => Some(source),
        Err(e) => {
            tracing::warn!("Host events unavailable: {e}");
            None
        }
    };
    let unreachable = EventBus::new(channels);
    unreachable.close();
    let events: &dyn EventSource = match &bridge {
        Some(source) => source,
        None => &unreachable,
    };

    let app = AppController::new(config);
    let mut tasks = app.spawn_tasks(host, events);
    if let Some(source) = &bridge {
        source.start();
    }
    println!("{}", console::HELP);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        _ = app.cancelled() => {
            tracing::info!("Quit from console");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::warn!("task exited early"),
                Ok(Err(e)) => tracing::error!("task failed: {e}"),
                Err(e) => tracing::error!("task panicked: {e}"),
            }
        }
    }

    app.shutdown();
    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(result) = tasks.join_next().await {
            if let Ok(Err(e)) = result {
                tracing::error!("task failed during shutdown: {e}");
            }
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!("tasks still running after shutdown, exiting anyway");
    }

    if let Some(source) = &bridge {
        source.shutdown();
    }
    Ok(())
}
