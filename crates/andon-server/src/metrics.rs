use andon_core::summary::TicketSummary;
use metrics::{counter, gauge};
use std::sync::OnceLock;

static METRICS_INIT: OnceLock<()> = OnceLock::new();

pub fn init_metrics() {
    METRICS_INIT.get_or_init(|| {
        // Metrics will be registered automatically when used
    });
}

pub fn record_fetch_ok() {
    counter!("fetch_ok_total").increment(1);
}

pub fn record_fetch_failed() {
    counter!("fetch_failed_total").increment(1);
}

pub fn record_fetch_deduped(kind: &str) {
    counter!("fetch_deduped_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_reconnect() {
    counter!("reconnects_total").increment(1);
}

pub fn record_update_ok() {
    counter!("updates_ok_total").increment(1);
}

pub fn record_update_failed() {
    counter!("updates_failed_total").increment(1);
}

pub fn record_alarm_engaged() {
    counter!("alarm_engaged_total").increment(1);
    gauge!("alarm_engaged").set(1.0);
}

pub fn record_alarm_silenced() {
    counter!("alarm_silenced_total").increment(1);
    gauge!("alarm_engaged").set(0.0);
}

pub fn update_ticket_gauges(summary: &TicketSummary, total: usize) {
    gauge!("tickets_open").set(summary.open as f64);
    gauge!("tickets_process").set(summary.process as f64);
    gauge!("tickets_closed").set(summary.closed as f64);
    gauge!("tickets_total").set(total as f64);
}
