//! turbosse demo server
//!
//! Routes:
//! - `GET /hello` - one JSON value, then the terminal event
//! - `GET /ticker` - a timed stream of ticks
//! - `GET /feed` - a push-based producer with derived ids and event names
//!
//! ```bash
//! cargo run -p turbosse-demo -- --bind 127.0.0.1:8080
//! curl -N http://127.0.0.1:8080/ticker
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use clap::Parser;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use turbosse::{EmitConfig, EmitError, EmitSettings, EventSource, Json, send_events};

#[derive(Parser, Debug)]
#[command(name = "turbosse-demo", about = "Serve example event streams")]
struct Cli {
    /// Configuration file (TOML, YAML, or JSON)
    #[arg(short, long, env = "TURBOSSE_DEMO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, overrides the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Log filter, overrides the config file (RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    bind: SocketAddr,
    log_level: String,
    tick_interval_ms: u64,
    tick_count: usize,
    emit: EmitSettings,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info,turbosse=debug".into(),
            tick_interval_ms: 1_000,
            tick_count: 10,
            emit: EmitSettings::default(),
        }
    }
}

impl DemoConfig {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(ref path) = cli.config {
            let format = turbosse::config::file_format(path)?;
            let path = path.to_str().context("config path is not valid UTF-8")?;
            builder = builder.add_source(config::File::new(path, format));
        }
        let mut config: Self = builder
            .add_source(
                config::Environment::with_prefix("TURBOSSE_DEMO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        if let Some(ref level) = cli.log_level {
            config.log_level.clone_from(level);
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct Tick {
    seq: usize,
    at: String,
}

#[derive(Serialize)]
struct FeedItem {
    kind: &'static str,
    seq: u64,
    value: u32,
}

async fn hello() -> Result<Response, EmitError> {
    let value = serde_json::json!({"hello": "world"});
    send_events(EventSource::<_>::single(Json(value)), EmitConfig::new()).await
}

async fn ticker(State(config): State<DemoConfig>) -> Result<Response, EmitError> {
    let interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
    let ticks = IntervalStream::new(interval)
        .take(config.tick_count)
        .enumerate()
        .map(|(seq, _)| {
            Json(Tick {
                seq,
                at: chrono::Utc::now().to_rfc3339(),
            })
        });

    let mut settings = config.emit.clone();
    settings.event.get_or_insert_with(|| "tick".into());
    send_events(EventSource::infallible(ticks), settings.into_config()?).await
}

async fn feed(State(config): State<DemoConfig>) -> Result<Response, EmitError> {
    let capacity = config.emit.channel_capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let count = config.tick_count as u64;
    let pause = Duration::from_millis(config.tick_interval_ms / 2);

    tokio::spawn(async move {
        for seq in 1..=count {
            let kind = if fastrand::bool() { "metric" } else { "notice" };
            let item = Json(FeedItem {
                kind,
                seq,
                value: fastrand::u32(0..100),
            });
            if tx.send(item).await.is_err() {
                debug!(seq, "feed consumer gone, stopping producer");
                return;
            }
            tokio::time::sleep(pause).await;
        }
    });

    let emit = EmitConfig::new()
        .with_id_generator(|item: &Json<FeedItem>| Some(format!("feed-{}", item.seq)))
        .with_event_fn(|item: &Json<FeedItem>| Some(item.kind))
        .with_channel_capacity(capacity);
    send_events(EventSource::from_receiver(rx), emit).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = DemoConfig::load(&cli)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = Router::new()
        .route("/hello", get(hello))
        .route("/ticker", get(ticker))
        .route("/feed", get(feed))
        .with_state(config.clone());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind))?;

    info!(
        "turbosse demo listening on http://{} (GET /hello, /ticker, /feed)",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
