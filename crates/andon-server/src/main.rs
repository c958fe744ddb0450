mod alert;
mod http;
mod metrics;
mod state;
mod tui;

use andon_api::client::TicketApi;
use andon_api::watcher::{TicketWatcher, WatchEvent};
use andon_core::alarm::{Alarm, AlarmTransition};
use andon_core::summary::TicketSummary;
use andon_core::timefmt::default_date_range;
use andon_core::types::ListQuery;
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use http::HttpState;
use metrics::init_metrics;
use state::{AppState, MonitorEvent};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tui::{run_tui, TuiApp};

#[derive(Parser)]
#[command(name = "andon")]
#[command(about = "Security andon ticket monitor with audible alarm and update console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the ticket board (interactive console by default)
    Watch(WatchOpts),
    /// Fetch once, print the counts and exit nonzero if any ticket is open
    Check(CheckOpts),
}

#[derive(Args)]
struct WatchOpts {
    /// Base URL of the andon ticket service
    #[arg(long, default_value = "http://127.0.0.1:3008")]
    api_url: String,
    /// First day of the fetch window (YYYY-MM-DD, defaults to the 1st of this month)
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Last day of the fetch window (YYYY-MM-DD, defaults to the end of next month)
    #[arg(long)]
    end_date: Option<NaiveDate>,
    /// Status filter forwarded to the ticket service
    #[arg(long, default_value = "0")]
    status_filter: String,
    /// Poll interval (e.g., "10s", "1m")
    #[arg(long, default_value = "10s")]
    interval: String,
    /// Window within which repeated refresh triggers collapse into one fetch
    #[arg(long, default_value = "5s")]
    dedupe_window: String,
    /// HTTP server address
    #[arg(long, default_value = "127.0.0.1:8080")]
    http: String,
    /// Alarm backend: player, bell or off
    #[arg(long, default_value = "player")]
    alarm: String,
    /// Audio clip looped while the alarm sounds
    #[arg(long, default_value = "assets/sound/alarm.wav")]
    alarm_sound: PathBuf,
    /// External audio player binary
    #[arg(long, default_value = "aplay")]
    alarm_player: String,
    /// Run without the console (logs to stdout, HTTP API only)
    #[arg(long)]
    headless: bool,
}

#[derive(Args)]
struct CheckOpts {
    /// Base URL of the andon ticket service
    #[arg(long, default_value = "http://127.0.0.1:3008")]
    api_url: String,
    /// First day of the fetch window (YYYY-MM-DD, defaults to the 1st of this month)
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Last day of the fetch window (YYYY-MM-DD, defaults to the end of next month)
    #[arg(long)]
    end_date: Option<NaiveDate>,
    /// Status filter forwarded to the ticket service
    #[arg(long, default_value = "0")]
    status_filter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(opts) => {
            init_tracing(opts.headless);
            watch(opts).await?;
        }
        Commands::Check(opts) => {
            init_tracing(true);
            check(opts).await?;
        }
    }

    Ok(())
}

fn init_tracing(to_stdout: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if to_stdout {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        // the raw-mode terminal owns stdout while the console runs
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
    }
}

async fn watch(opts: WatchOpts) -> anyhow::Result<()> {
    let interval = parse_duration(&opts.interval)
        .context("Invalid interval format (e.g., '10s', '1m')")?;
    let dedupe_window = parse_duration(&opts.dedupe_window)
        .context("Invalid dedupe window format (e.g., '5s')")?;

    let query = build_query(opts.start_date, opts.end_date, &opts.status_filter);
    info!(
        url = %opts.api_url,
        start = %query.start_date,
        end = %query.end_date,
        interval_secs = interval.as_secs(),
        "Starting andon monitor"
    );

    init_metrics();
    let _metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    let sink = alert::build_sink(&opts.alarm, opts.alarm_player.clone(), opts.alarm_sound.clone())?;
    let state = AppState::new(query.clone(), Alarm::new(sink), interval);
    let api = TicketApi::new(opts.api_url.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    // Spawn the poller
    let watcher = TicketWatcher::new(
        api.clone(),
        query,
        interval,
        dedupe_window,
        event_tx,
        command_rx,
    );
    let watcher_handle = tokio::spawn(watcher.run());

    // Spawn the event processor
    let state_clone = state.clone();
    let processor_handle = tokio::spawn(async move {
        process_watch_events(&state_clone, &mut event_rx).await;
    });

    // Start HTTP server
    let router = http::router(HttpState {
        app: state.clone(),
        commands: command_tx.clone(),
    });
    let http_addr = opts.http.clone();
    let server_handle = tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(&http_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind HTTP server on {}: {}", http_addr, e);
                return;
            }
        };
        info!("HTTP server listening on http://{}", http_addr);
        if let Err(e) = axum::serve(listener, router).await {
            error!("HTTP server error: {}", e);
        }
    });

    if opts.headless {
        tokio::select! {
            _ = watcher_handle => {
                warn!("Watcher task ended");
            }
            _ = processor_handle => {
                warn!("Processor task ended");
            }
            _ = server_handle => {
                warn!("HTTP server task ended");
            }
        }
    } else {
        run_tui(TuiApp::new(state), api, command_tx).await?;
    }

    Ok(())
}

async fn process_watch_events(
    state: &AppState,
    events: &mut mpsc::UnboundedReceiver<WatchEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            WatchEvent::FetchStarted { kind } => {
                debug!(kind = kind.as_str(), "fetch started");
                state.set_refreshing(true);
            }
            WatchEvent::Fetched { tickets, query } => {
                let applied = state.apply_fetch(tickets, query).await;
                metrics::record_fetch_ok();
                metrics::update_ticket_gauges(&applied.summary, applied.total);
                state
                    .push_event(MonitorEvent::FetchOk {
                        total: applied.total,
                        open: applied.summary.open,
                    })
                    .await;

                match applied.transition {
                    Some(AlarmTransition::Engaged) => {
                        warn!(open = applied.summary.open, "Open tickets present, alarm engaged");
                        metrics::record_alarm_engaged();
                        state.push_event(MonitorEvent::AlarmEngaged).await;
                    }
                    Some(AlarmTransition::Silenced) => {
                        info!("No open tickets remain, alarm silenced");
                        metrics::record_alarm_silenced();
                        state.push_event(MonitorEvent::AlarmSilenced).await;
                    }
                    None => {}
                }
            }
            WatchEvent::FetchFailed {
                error,
                transport,
                query: _,
            } => {
                warn!(transport, "Fetch failed: {}", error);
                state.record_fetch_error(error.clone()).await;
                metrics::record_fetch_failed();
                state.push_event(MonitorEvent::FetchFailed { error }).await;
            }
            WatchEvent::Skipped { kind } => {
                debug!(kind = kind.as_str(), "fetch deduplicated");
                metrics::record_fetch_deduped(kind.as_str());
                state
                    .push_event(MonitorEvent::FetchDeduped {
                        kind: kind.as_str().to_string(),
                    })
                    .await;
            }
            WatchEvent::Reconnected => {
                info!("Ticket service reachable again");
                metrics::record_reconnect();
                state.push_event(MonitorEvent::Reconnected).await;
            }
        }
    }
}

async fn check(opts: CheckOpts) -> anyhow::Result<()> {
    let query = build_query(opts.start_date, opts.end_date, &opts.status_filter);
    let api = TicketApi::new(opts.api_url);

    let tickets = api
        .list_tickets(&query)
        .await
        .context("Failed to fetch tickets")?;
    let summary = TicketSummary::from_tickets(&tickets);

    println!(
        "{} tickets between {} and {}",
        tickets.len(),
        query.start_date,
        query.end_date
    );
    println!("  open:    {}", summary.open);
    println!("  process: {}", summary.process);
    println!("  closed:  {}", summary.closed);

    if summary.has_open() {
        std::process::exit(1);
    }
    Ok(())
}

fn build_query(start: Option<NaiveDate>, end: Option<NaiveDate>, status: &str) -> ListQuery {
    let (default_start, default_end) = default_date_range(Utc::now().date_naive());
    ListQuery::new(
        start.unwrap_or(default_start),
        end.unwrap_or(default_end),
        status,
    )
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.ends_with('s') {
        let secs: u64 = s[..s.len() - 1].parse()?;
        Ok(Duration::from_secs(secs))
    } else if s.ends_with('m') {
        let mins: u64 = s[..s.len() - 1].parse()?;
        Ok(Duration::from_secs(mins * 60))
    } else {
        // Try parsing as seconds
        let secs: u64 = s.parse()?;
        Ok(Duration::from_secs(secs))
    }
}
