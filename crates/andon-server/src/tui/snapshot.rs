use crate::state::{AppState, MonitorEvent, MonitorEventEntry};
use crate::tui::widgets::EventColor;
use andon_core::alarm::AlarmState;
use andon_core::summary::TicketSummary;
use andon_core::timefmt::format_timestamp;
use andon_core::types::{ListQuery, Ticket, TicketStatus};
use chrono::{DateTime, Utc};

const EVENT_LOG_LINES: usize = 30;

/// Immutable view of shared state taken once per frame.
#[derive(Clone)]
pub struct UiSnapshot {
    pub query: ListQuery,
    pub refreshing: bool,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub summary: TicketSummary,
    pub alarm: AlarmState,
    pub tickets: Vec<Ticket>,
    pub rows: Vec<TicketRow>,
    pub events: Vec<EventLine>,
    pub uptime_seconds: u64,
    pub interval_secs: u64,
}

#[derive(Clone)]
pub struct TicketRow {
    pub id_ticket: String,
    pub created: String,
    pub department: String,
    pub pic: String,
    pub status: TicketStatus,
    pub updated: String,
    pub has_evidence: bool,
}

#[derive(Clone)]
pub struct EventLine {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub color: EventColor,
}

impl UiSnapshot {
    pub async fn from_state(state: &AppState) -> Self {
        let tickets = state.tickets().await;
        let rows = tickets
            .iter()
            .map(|ticket| TicketRow {
                id_ticket: ticket.id_ticket.to_string(),
                created: format_timestamp(&ticket.created_at),
                department: ticket.department.clone(),
                pic: ticket.pic().to_string(),
                status: ticket.status_ticket,
                updated: format_timestamp(&ticket.updated_at),
                has_evidence: ticket.has_evidence(),
            })
            .collect();

        let events = state
            .get_events(EVENT_LOG_LINES)
            .await
            .iter()
            .map(describe_event)
            .collect();

        Self {
            query: state.query().await,
            refreshing: state.is_refreshing(),
            last_fetch_at: state.last_fetch_at().await,
            last_error: state.last_error().await,
            summary: state.summary().await,
            alarm: state.alarm_state(),
            tickets,
            rows,
            events,
            uptime_seconds: state.uptime_seconds(),
            interval_secs: state.poll_interval.as_secs(),
        }
    }
}

fn describe_event(entry: &MonitorEventEntry) -> EventLine {
    let (text, color) = match &entry.event {
        MonitorEvent::FetchOk { total, open } => (
            format!("FETCH_OK {} tickets ({} open)", total, open),
            EventColor::Normal,
        ),
        MonitorEvent::FetchFailed { error } => {
            (format!("FETCH_FAILED {}", error), EventColor::Error)
        }
        MonitorEvent::FetchDeduped { kind } => {
            (format!("FETCH_DEDUPED {}", kind), EventColor::Info)
        }
        MonitorEvent::Reconnected => ("RECONNECTED".to_string(), EventColor::Info),
        MonitorEvent::AlarmEngaged => ("ALARM_ENGAGED".to_string(), EventColor::Error),
        MonitorEvent::AlarmSilenced => ("ALARM_SILENCED".to_string(), EventColor::Normal),
        MonitorEvent::AlarmToggled { engaged } => (
            if *engaged {
                "ALARM_ENGAGED_MANUALLY".to_string()
            } else {
                "ALARM_SILENCED_MANUALLY".to_string()
            },
            EventColor::Warning,
        ),
        MonitorEvent::UpdateSubmitted { id_ticket } => (
            format!("UPDATE_OK ticket {}", id_ticket),
            EventColor::Info,
        ),
        MonitorEvent::UpdateFailed { id_ticket, error } => (
            format!("UPDATE_FAILED ticket {} ({})", id_ticket, error),
            EventColor::Error,
        ),
        MonitorEvent::FilterChanged {
            start_date,
            end_date,
        } => (
            format!("FILTER {}..{}", start_date, end_date),
            EventColor::Info,
        ),
    };
    EventLine {
        timestamp: entry.timestamp,
        text,
        color,
    }
}
