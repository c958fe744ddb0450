use std::sync::atomic::{AtomicBool, Ordering};

/// Where the audible alert actually goes. Implementations must make both
/// calls idempotent: `start` while already sounding and `stop` while silent
/// are no-ops.
pub trait AlarmSink: Send + Sync {
    fn start(&self) -> anyhow::Result<()>;
    fn stop(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Silent,
    Engaged,
}

impl AlarmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmState::Silent => "silent",
            AlarmState::Engaged => "engaged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTransition {
    Engaged,
    Silenced,
}

/// Audible-alert state, re-derived from the ticket collection on every
/// fetch. A manual toggle overrides the derived state only until the next
/// fetch lands.
///
/// Playback is best effort: a sink failure is logged and the logical state
/// still advances, so the console always reflects whether open tickets
/// exist. `start` is re-invoked on every sync while open tickets remain,
/// which retries playback that was previously refused.
pub struct Alarm {
    sink: Box<dyn AlarmSink>,
    engaged: AtomicBool,
}

impl Alarm {
    pub fn new(sink: Box<dyn AlarmSink>) -> Self {
        Self {
            sink,
            engaged: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> AlarmState {
        if self.engaged.load(Ordering::SeqCst) {
            AlarmState::Engaged
        } else {
            AlarmState::Silent
        }
    }

    /// Reconcile with a freshly fetched collection. Returns the transition
    /// when the logical state changed.
    pub fn sync(&self, has_open: bool) -> Option<AlarmTransition> {
        if has_open {
            self.start_sink();
            if !self.engaged.swap(true, Ordering::SeqCst) {
                Some(AlarmTransition::Engaged)
            } else {
                None
            }
        } else {
            self.sink.stop();
            if self.engaged.swap(false, Ordering::SeqCst) {
                Some(AlarmTransition::Silenced)
            } else {
                None
            }
        }
    }

    /// Manual override from the console. Holds only until the next sync.
    pub fn toggle(&self) -> AlarmTransition {
        if self.engaged.swap(false, Ordering::SeqCst) {
            self.sink.stop();
            AlarmTransition::Silenced
        } else {
            self.engaged.store(true, Ordering::SeqCst);
            self.start_sink();
            AlarmTransition::Engaged
        }
    }

    fn start_sink(&self) {
        if let Err(e) = self.sink.start() {
            tracing::warn!(error = %e, "alarm playback failed to start");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        fail_start: bool,
    }

    impl AlarmSink for RecordingSink {
        fn start(&self) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                anyhow::bail!("playback refused");
            }
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn recording_alarm(fail_start: bool) -> (Alarm, RecordingSink) {
        let sink = RecordingSink {
            fail_start,
            ..Default::default()
        };
        (Alarm::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn test_engages_on_open_and_silences_on_none() {
        let (alarm, sink) = recording_alarm(false);
        assert_eq!(alarm.state(), AlarmState::Silent);

        assert_eq!(alarm.sync(true), Some(AlarmTransition::Engaged));
        assert_eq!(alarm.state(), AlarmState::Engaged);

        assert_eq!(alarm.sync(false), Some(AlarmTransition::Silenced));
        assert_eq!(alarm.state(), AlarmState::Silent);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 1);
        assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sync_reports_no_transition_when_unchanged() {
        let (alarm, sink) = recording_alarm(false);
        assert_eq!(alarm.sync(true), Some(AlarmTransition::Engaged));
        assert_eq!(alarm.sync(true), None);
        assert_eq!(alarm.sync(true), None);
        // start is retried every sync while open tickets remain
        assert_eq!(sink.starts.load(Ordering::SeqCst), 3);

        assert_eq!(alarm.sync(false), Some(AlarmTransition::Silenced));
        assert_eq!(alarm.sync(false), None);
    }

    #[test]
    fn test_empty_collection_silences() {
        let (alarm, _) = recording_alarm(false);
        alarm.sync(true);
        assert_eq!(alarm.state(), AlarmState::Engaged);
        assert_eq!(alarm.sync(false), Some(AlarmTransition::Silenced));
        assert_eq!(alarm.state(), AlarmState::Silent);
    }

    #[test]
    fn test_manual_toggle_overridden_by_next_sync() {
        let (alarm, _) = recording_alarm(false);
        alarm.sync(true);

        assert_eq!(alarm.toggle(), AlarmTransition::Silenced);
        assert_eq!(alarm.state(), AlarmState::Silent);

        // next fetch still sees open tickets and re-engages
        assert_eq!(alarm.sync(true), Some(AlarmTransition::Engaged));
        assert_eq!(alarm.state(), AlarmState::Engaged);
    }

    #[test]
    fn test_manual_engage_while_silent() {
        let (alarm, _) = recording_alarm(false);
        assert_eq!(alarm.toggle(), AlarmTransition::Engaged);
        assert_eq!(alarm.state(), AlarmState::Engaged);
        assert_eq!(alarm.sync(false), Some(AlarmTransition::Silenced));
    }

    #[test]
    fn test_playback_failure_still_engages() {
        let (alarm, sink) = recording_alarm(true);
        assert_eq!(alarm.sync(true), Some(AlarmTransition::Engaged));
        assert_eq!(alarm.state(), AlarmState::Engaged);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 1);

        // retried on the next sync even though the state did not change
        assert_eq!(alarm.sync(true), None);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 2);
    }
}
