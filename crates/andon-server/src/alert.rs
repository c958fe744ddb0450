use andon_core::alarm::AlarmSink;
use anyhow::bail;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(150);
const BELL_INTERVAL: Duration = Duration::from_secs(2);

/// Build the configured sink. `player` shells out to an audio player in a
/// loop, `bell` repeats the terminal bell, `off` disables sound entirely.
pub fn build_sink(
    mode: &str,
    player: String,
    sound: PathBuf,
) -> anyhow::Result<Box<dyn AlarmSink>> {
    match mode {
        "player" => Ok(Box::new(PlayerAlarm::new(player, sound))),
        "bell" => Ok(Box::new(BellAlarm::new())),
        "off" => Ok(Box::new(SilentAlarm)),
        other => bail!("Unknown alarm mode '{}' (expected player, bell or off)", other),
    }
}

/// Loops an external audio player over the alarm clip until stopped. The
/// player process is killed on stop so silencing is immediate.
pub struct PlayerAlarm {
    player: String,
    sound: PathBuf,
    playing: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    current: Arc<Mutex<Option<Child>>>,
}

impl PlayerAlarm {
    pub fn new(player: String, sound: PathBuf) -> Self {
        Self {
            player,
            sound,
            playing: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            current: Arc::new(Mutex::new(None)),
        }
    }
}

impl AlarmSink for PlayerAlarm {
    fn start(&self) -> anyhow::Result<()> {
        if self.playing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if !self.sound.exists() {
            self.playing.store(false, Ordering::SeqCst);
            bail!("alarm sound not found at {}", self.sound.display());
        }

        // a loop left over from an earlier start exits once it sees the bump
        let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let player = self.player.clone();
        let sound = self.sound.clone();
        let playing = self.playing.clone();
        let generation = self.generation.clone();
        let current = self.current.clone();
        tokio::spawn(async move {
            while playing.load(Ordering::SeqCst) && generation.load(Ordering::SeqCst) == my_gen {
                let spawned = Command::new(&player)
                    .arg(&sound)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn();
                let child = match spawned {
                    Ok(child) => child,
                    Err(e) => {
                        warn!(player = %player, error = %e, "failed to spawn alarm player");
                        playing.store(false, Ordering::SeqCst);
                        break;
                    }
                };
                if let Ok(mut guard) = current.lock() {
                    *guard = Some(child);
                }

                // wait for this playthrough without holding the lock
                loop {
                    let done = match current.lock() {
                        Ok(mut guard) => match guard.as_mut() {
                            Some(child) => match child.try_wait() {
                                Ok(Some(status)) => {
                                    // a kill from stop() also lands here; only a
                                    // crash in the current generation silences
                                    if !status.success()
                                        && playing.load(Ordering::SeqCst)
                                        && generation.load(Ordering::SeqCst) == my_gen
                                    {
                                        warn!(%status, "alarm player exited abnormally");
                                        playing.store(false, Ordering::SeqCst);
                                    }
                                    *guard = None;
                                    true
                                }
                                Ok(None) => false,
                                Err(e) => {
                                    warn!(error = %e, "failed to poll alarm player");
                                    *guard = None;
                                    true
                                }
                            },
                            None => true,
                        },
                        Err(_) => true,
                    };
                    if done {
                        break;
                    }
                    tokio::time::sleep(CHILD_POLL_INTERVAL).await;
                }
            }

            if generation.load(Ordering::SeqCst) == my_gen {
                if let Ok(mut guard) = current.lock() {
                    if let Some(child) = guard.as_mut() {
                        let _ = child.start_kill();
                    }
                    *guard = None;
                }
            }
            debug!("alarm player loop ended");
        });
        Ok(())
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = self.current.lock() {
            if let Some(child) = guard.as_mut() {
                let _ = child.start_kill();
            }
        }
    }
}

/// Repeats the terminal bell. Works over SSH and needs no audio stack.
pub struct BellAlarm {
    ringing: Arc<AtomicBool>,
}

impl BellAlarm {
    pub fn new() -> Self {
        Self {
            ringing: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for BellAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmSink for BellAlarm {
    fn start(&self) -> anyhow::Result<()> {
        if self.ringing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let ringing = self.ringing.clone();
        tokio::spawn(async move {
            use std::io::Write;
            while ringing.load(Ordering::SeqCst) {
                let mut stdout = std::io::stdout();
                let _ = stdout.write_all(b"\x07");
                let _ = stdout.flush();
                tokio::time::sleep(BELL_INTERVAL).await;
            }
        });
        Ok(())
    }

    fn stop(&self) {
        self.ringing.store(false, Ordering::SeqCst);
    }
}

pub struct SilentAlarm;

impl AlarmSink for SilentAlarm {
    fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sink_modes() {
        assert!(build_sink("player", "aplay".to_string(), PathBuf::from("a.wav")).is_ok());
        assert!(build_sink("bell", String::new(), PathBuf::new()).is_ok());
        assert!(build_sink("off", String::new(), PathBuf::new()).is_ok());
        assert!(build_sink("loud", String::new(), PathBuf::new()).is_err());
    }

    #[test]
    fn test_player_start_fails_without_sound_file() {
        let sink = PlayerAlarm::new(
            "aplay".to_string(),
            PathBuf::from("/nonexistent/alarm.wav"),
        );
        assert!(sink.start().is_err());
        // failed start leaves the sink stopped so it can be retried
        assert!(!sink.playing.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_bell_start_is_idempotent() {
        let sink = BellAlarm::new();
        assert!(sink.start().is_ok());
        assert!(sink.start().is_ok());
        assert!(sink.ringing.load(Ordering::SeqCst));
        sink.stop();
        assert!(!sink.ringing.load(Ordering::SeqCst));
        sink.stop();
    }
}
