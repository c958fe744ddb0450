use andon_core::alarm::{Alarm, AlarmState, AlarmTransition};
use andon_core::summary::TicketSummary;
use andon_core::types::{ListQuery, Ticket};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const EVENT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    FetchOk { total: usize, open: usize },
    FetchFailed { error: String },
    FetchDeduped { kind: String },
    Reconnected,
    AlarmEngaged,
    AlarmSilenced,
    AlarmToggled { engaged: bool },
    UpdateSubmitted { id_ticket: i64 },
    UpdateFailed { id_ticket: i64, error: String },
    FilterChanged { start_date: NaiveDate, end_date: NaiveDate },
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorEventEntry {
    pub timestamp: DateTime<Utc>,
    pub event: MonitorEvent,
}

/// Outcome of folding one fetched collection into shared state.
pub struct FetchApplied {
    pub summary: TicketSummary,
    pub transition: Option<AlarmTransition>,
    pub total: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub query: Arc<RwLock<ListQuery>>,
    pub tickets: Arc<RwLock<Vec<Ticket>>>,
    pub summary: Arc<RwLock<TicketSummary>>,
    pub alarm: Arc<Alarm>,
    pub refreshing: Arc<AtomicBool>,
    pub last_fetch_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub last_error: Arc<RwLock<Option<String>>>,
    pub event_log: Arc<RwLock<VecDeque<MonitorEventEntry>>>,
    pub start_time: Instant,
    pub poll_interval: Duration,
}

impl AppState {
    pub fn new(query: ListQuery, alarm: Alarm, poll_interval: Duration) -> Self {
        Self {
            query: Arc::new(RwLock::new(query)),
            tickets: Arc::new(RwLock::new(Vec::new())),
            summary: Arc::new(RwLock::new(TicketSummary::default())),
            alarm: Arc::new(alarm),
            refreshing: Arc::new(AtomicBool::new(false)),
            last_fetch_at: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
            event_log: Arc::new(RwLock::new(VecDeque::new())),
            start_time: Instant::now(),
            poll_interval,
        }
    }

    /// Replace the collection with a fresh fetch: recompute counts, clear
    /// any stale error, and reconcile the alarm with whether open tickets
    /// remain.
    pub async fn apply_fetch(&self, tickets: Vec<Ticket>, query: ListQuery) -> FetchApplied {
        let summary = TicketSummary::from_tickets(&tickets);
        let total = tickets.len();

        *self.tickets.write().await = tickets;
        *self.summary.write().await = summary;
        *self.query.write().await = query;
        *self.last_fetch_at.write().await = Some(Utc::now());
        *self.last_error.write().await = None;
        self.set_refreshing(false);

        let transition = self.alarm.sync(summary.has_open());
        FetchApplied {
            summary,
            transition,
            total,
        }
    }

    /// A failed fetch keeps the last good collection on screen and only
    /// raises the error banner.
    pub async fn record_fetch_error(&self, error: String) {
        *self.last_error.write().await = Some(error);
        self.set_refreshing(false);
    }

    pub fn set_refreshing(&self, refreshing: bool) {
        self.refreshing.store(refreshing, Ordering::SeqCst);
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    pub async fn set_query(&self, query: ListQuery) {
        *self.query.write().await = query;
    }

    pub async fn query(&self) -> ListQuery {
        self.query.read().await.clone()
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().await.clone()
    }

    pub async fn summary(&self) -> TicketSummary {
        *self.summary.read().await
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    pub async fn last_fetch_at(&self) -> Option<DateTime<Utc>> {
        *self.last_fetch_at.read().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn push_event(&self, event: MonitorEvent) {
        let mut log = self.event_log.write().await;
        log.push_back(MonitorEventEntry {
            timestamp: Utc::now(),
            event,
        });
        while log.len() > EVENT_LOG_CAPACITY {
            log.pop_front();
        }
    }

    pub async fn get_events(&self, limit: usize) -> Vec<MonitorEventEntry> {
        let log = self.event_log.read().await;
        let start = log.len().saturating_sub(limit);
        log.iter().skip(start).cloned().collect()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use andon_core::alarm::AlarmSink;
    use andon_core::types::TicketStatus;

    struct NullSink;

    impl AlarmSink for NullSink {
        fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn stop(&self) {}
    }

    fn test_state() -> AppState {
        let query = ListQuery::new(
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            "0",
        );
        AppState::new(
            query,
            Alarm::new(Box::new(NullSink)),
            Duration::from_secs(10),
        )
    }

    fn ticket(id: i64, status: TicketStatus) -> Ticket {
        Ticket {
            id_andon_security: id,
            id_ticket: id,
            created_at: "2026-08-02 07:15:00".to_string(),
            department: "Stamping".to_string(),
            pic_security: None,
            updated_at: "2026-08-02 08:00:00".to_string(),
            evidence_updated: String::new(),
            evidence_uploaded: String::new(),
            status_ticket: status,
        }
    }

    #[tokio::test]
    async fn test_apply_fetch_updates_counts_and_alarm() {
        let state = test_state();
        let query = state.query().await;

        let applied = state
            .apply_fetch(vec![ticket(1, TicketStatus::Open)], query.clone())
            .await;
        assert_eq!(applied.summary.open, 1);
        assert_eq!(applied.total, 1);
        assert_eq!(applied.transition, Some(AlarmTransition::Engaged));
        assert_eq!(state.alarm_state(), AlarmState::Engaged);
        assert!(state.last_fetch_at().await.is_some());

        // unchanged collection reports no transition
        let applied = state
            .apply_fetch(vec![ticket(1, TicketStatus::Open)], query.clone())
            .await;
        assert_eq!(applied.transition, None);

        // empty collection silences
        let applied = state.apply_fetch(vec![], query).await;
        assert_eq!(applied.transition, Some(AlarmTransition::Silenced));
        assert_eq!(state.alarm_state(), AlarmState::Silent);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_stale_collection() {
        let state = test_state();
        let query = state.query().await;
        state
            .apply_fetch(vec![ticket(1, TicketStatus::Process)], query.clone())
            .await;

        state.record_fetch_error("connection refused".to_string()).await;
        assert_eq!(state.tickets().await.len(), 1);
        assert_eq!(state.summary().await.process, 1);
        assert_eq!(
            state.last_error().await.as_deref(),
            Some("connection refused")
        );

        // next successful fetch clears the banner
        state.apply_fetch(vec![], query).await;
        assert!(state.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_event_log_is_bounded() {
        let state = test_state();
        for i in 0..(EVENT_LOG_CAPACITY + 25) {
            state
                .push_event(MonitorEvent::UpdateSubmitted { id_ticket: i as i64 })
                .await;
        }
        let events = state.get_events(usize::MAX).await;
        assert_eq!(events.len(), EVENT_LOG_CAPACITY);

        let recent = state.get_events(10).await;
        assert_eq!(recent.len(), 10);
        match &recent[9].event {
            MonitorEvent::UpdateSubmitted { id_ticket } => {
                assert_eq!(*id_ticket, (EVENT_LOG_CAPACITY + 24) as i64)
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
