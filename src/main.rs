//! SafeSight Console - operator dashboard runner
//!
//! Main entry point: restores or establishes the session, mounts the control
//! center and reports feed and sidebar state until interrupted.

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use safesight_console::{
    dashboard::Dashboard,
    models::NoticeLevel,
    session_store::{FileTokenStore, SessionBus, SessionStore},
    ConsoleConfig, ConsoleState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "safesight-console", version, about = "SafeSight operator console")]
struct Args {
    /// Backend API base URL (overrides CONSOLE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// MJPEG stream endpoint (overrides CONSOLE_STREAM_URL)
    #[arg(long)]
    stream_url: Option<String>,

    /// Log in with these credentials when no valid token is stored
    #[arg(short, long)]
    username: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// Clear the stored token and exit
    #[arg(long)]
    logout: bool,

    /// Capture a snapshot of this camera after mounting
    #[arg(long, value_name = "CAMERA_ID")]
    snapshot: Option<String>,

    /// Run AI analysis on this camera after mounting
    #[arg(long, value_name = "CAMERA_ID")]
    analyze: Option<String>,

    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(long, value_name = "SECS")]
    run_for: Option<u64>,

    /// Seconds between status reports
    #[arg(long, default_value_t = 10)]
    report_every: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safesight_console=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SafeSight Console v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = ConsoleConfig::default();
    if let Some(url) = args.api_url.clone() {
        config.api_url = url;
    }
    if let Some(url) = args.stream_url.clone() {
        config.stream_url = url;
    }
    tracing::info!(api_url = %config.api_url, stream_url = %config.stream_url, "Configuration loaded");

    let cameras = config.load_cameras().await.context("loading camera roster")?;
    let (api, grabber) = ConsoleState::http_components(&config)?;

    let tokens = Arc::new(FileTokenStore::new(config.token_path()));
    tracing::debug!(path = %tokens.path().display(), "Token store");
    let session =
        SessionStore::open(api.clone(), tokens, SessionBus::new(), config.request_timeout).await;

    if args.logout {
        session.logout().await;
        return Ok(());
    }

    if !session.is_authenticated() {
        match (&args.username, &args.password) {
            (Some(username), Some(password)) => {
                let user = session.login(username, password).await?;
                tracing::info!(operator = %user.display_name(), "Logged in");
            }
            _ => bail!("no valid session; pass --username and --password to log in"),
        }
    }

    let state = ConsoleState {
        config,
        backend: api,
        frames: grabber,
        cameras,
        session,
    };

    let dashboard = Dashboard::mount(&state)?;
    tokio::spawn(log_notices(dashboard.subscribe_notices()));

    if let Some(camera_id) = &args.snapshot {
        let feed = dashboard
            .feed(camera_id)
            .ok_or_else(|| anyhow!("unknown camera {}", camera_id))?;
        if let Ok(path) = feed.snapshot().await {
            tracing::info!(camera_id = %camera_id, path = %path.display(), "Snapshot written");
        }
    }

    if let Some(camera_id) = &args.analyze {
        let feed = dashboard
            .feed(camera_id)
            .ok_or_else(|| anyhow!("unknown camera {}", camera_id))?;
        if let Ok(report) = feed.analyze().await {
            tracing::info!(
                camera_id = %camera_id,
                threat_level = %report.threat_level,
                objects = report.objects.len(),
                "{}",
                report.summary
            );
        }
    }

    run(&dashboard, args.run_for.map(Duration::from_secs), args.report_every).await;

    dashboard.unmount();
    tracing::info!("SafeSight Console stopped");
    Ok(())
}

/// Report status until Ctrl-C, the deadline, or the session ending
async fn run(dashboard: &Dashboard, run_for: Option<Duration>, report_every: u64) {
    let deadline = async {
        match run_for {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval(Duration::from_secs(report_every.max(1)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = &mut deadline => break,
            _ = ticker.tick() => {
                if !dashboard.is_active() {
                    tracing::warn!("Session ended, dashboard closed");
                    break;
                }
                report(dashboard);
            }
        }
    }
}

fn report(dashboard: &Dashboard) {
    let view = dashboard.sidebar().view();
    tracing::info!(
        session = %view.session_clock,
        buffer = %format!("{:.0}%", view.telemetry.buffer),
        cpu = %format!("{:.0}%", view.telemetry.cpu),
        ping = %format!("{:.0}ms", view.telemetry.ping),
        events = view.events.len(),
        latest = view.events.first().map(|e| e.severity.as_str()).unwrap_or("-"),
        "Sidebar"
    );

    for feed in dashboard.feed_states() {
        tracing::debug!(
            camera_id = %feed.camera_id,
            connection = ?feed.connection,
            recording = %feed.recording_label().unwrap_or_default(),
            analysis = ?feed.analysis,
            "Feed"
        );
    }
}

async fn log_notices(mut rx: broadcast::Receiver<safesight_console::models::Notice>) {
    loop {
        match rx.recv().await {
            Ok(notice) => match notice.level {
                NoticeLevel::Success => {
                    tracing::info!(camera_id = %notice.camera_id, "{}", notice.message)
                }
                NoticeLevel::Error => {
                    tracing::warn!(camera_id = %notice.camera_id, "{}", notice.message)
                }
            },
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
