use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use andon_core::types::{ListQuery, Ticket};

use crate::client::TicketApi;
use crate::dedupe::FetchDeduper;

const PROBE_INTERVAL: Duration = Duration::from_secs(3);

/// Why a fetch attempt was made. Every trigger funnels into the same
/// deduplicated fetch; only the post-update refetch bypasses the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Startup,
    Interval,
    Focus,
    Reconnect,
    Manual,
    AfterUpdate,
}

impl RefreshKind {
    pub fn forces_fetch(&self) -> bool {
        matches!(self, RefreshKind::AfterUpdate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshKind::Startup => "startup",
            RefreshKind::Interval => "interval",
            RefreshKind::Focus => "focus",
            RefreshKind::Reconnect => "reconnect",
            RefreshKind::Manual => "manual",
            RefreshKind::AfterUpdate => "after_update",
        }
    }
}

#[derive(Debug)]
pub enum WatchCommand {
    Refresh(RefreshKind),
    SetQuery(ListQuery),
}

#[derive(Debug, Clone)]
pub enum WatchEvent {
    FetchStarted { kind: RefreshKind },
    Fetched { tickets: Vec<Ticket>, query: ListQuery },
    FetchFailed { error: String, transport: bool, query: ListQuery },
    Skipped { kind: RefreshKind },
    Reconnected,
}

/// Polls the ticket service and forwards outcomes over a channel. Owns the
/// filter window; consumers change it with `WatchCommand::SetQuery`, which
/// fetches immediately under the new window.
///
/// After a transport failure the watcher keeps its polling cadence and
/// additionally probes the host every few seconds; the first successful
/// probe emits `Reconnected` and fetches right away.
pub struct TicketWatcher {
    api: TicketApi,
    query: ListQuery,
    interval: Duration,
    deduper: FetchDeduper,
    offline: bool,
    events: mpsc::UnboundedSender<WatchEvent>,
    commands: mpsc::UnboundedReceiver<WatchCommand>,
}

impl TicketWatcher {
    pub fn new(
        api: TicketApi,
        query: ListQuery,
        interval: Duration,
        dedupe_window: Duration,
        events: mpsc::UnboundedSender<WatchEvent>,
        commands: mpsc::UnboundedReceiver<WatchCommand>,
    ) -> Self {
        Self {
            api,
            query,
            interval,
            deduper: FetchDeduper::new(dedupe_window),
            offline: false,
            events,
            commands,
        }
    }

    pub async fn run(mut self) {
        info!(
            url = self.api.base_url(),
            interval_secs = self.interval.as_secs(),
            "starting ticket watcher"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut probe_ticker = tokio::time::interval(PROBE_INTERVAL);
        probe_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut first_tick = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let kind = if first_tick {
                        RefreshKind::Startup
                    } else {
                        RefreshKind::Interval
                    };
                    first_tick = false;
                    self.attempt(kind).await;
                }
                _ = probe_ticker.tick(), if self.offline => {
                    if self.api.probe().await {
                        info!("ticket service reachable again");
                        self.offline = false;
                        let _ = self.events.send(WatchEvent::Reconnected);
                        self.attempt(RefreshKind::Reconnect).await;
                    }
                }
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(WatchCommand::Refresh(kind)) => self.attempt(kind).await,
                        Some(WatchCommand::SetQuery(query)) => {
                            debug!(
                                start = %query.start_date,
                                end = %query.end_date,
                                "filter window changed"
                            );
                            self.query = query;
                            self.attempt(RefreshKind::Manual).await;
                        }
                        None => {
                            // all command senders dropped, console is gone
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn attempt(&mut self, kind: RefreshKind) {
        if !self
            .deduper
            .should_fetch(&self.query, kind.forces_fetch(), Instant::now())
        {
            debug!(kind = kind.as_str(), "fetch deduplicated");
            let _ = self.events.send(WatchEvent::Skipped { kind });
            return;
        }

        let _ = self.events.send(WatchEvent::FetchStarted { kind });
        match self.api.list_tickets(&self.query).await {
            Ok(tickets) => {
                debug!(kind = kind.as_str(), count = tickets.len(), "fetched tickets");
                self.offline = false;
                let _ = self.events.send(WatchEvent::Fetched {
                    tickets,
                    query: self.query.clone(),
                });
            }
            Err(e) => {
                warn!(kind = kind.as_str(), error = %e, "ticket fetch failed");
                let transport = e.is_transport();
                let _ = self.events.send(WatchEvent::FetchFailed {
                    error: e.to_string(),
                    transport,
                    query: self.query.clone(),
                });
                if transport {
                    self.offline = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_post_update_refetch_forces() {
        assert!(RefreshKind::AfterUpdate.forces_fetch());
        assert!(!RefreshKind::Startup.forces_fetch());
        assert!(!RefreshKind::Interval.forces_fetch());
        assert!(!RefreshKind::Focus.forces_fetch());
        assert!(!RefreshKind::Reconnect.forces_fetch());
        assert!(!RefreshKind::Manual.forces_fetch());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(RefreshKind::AfterUpdate.as_str(), "after_update");
        assert_eq!(RefreshKind::Focus.as_str(), "focus");
    }
}
