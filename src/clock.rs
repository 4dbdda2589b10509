#![cfg(feature = "std")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

/// How often the countdown re-publishes the remaining time.
pub const TICK: Duration = Duration::from_millis(50);

/// Format milliseconds as `mm:ss`, rounding partial seconds down.
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Countdown for one turn. The display string is published on a watch
/// channel; the task ends at `00:00` or when stopped.
pub struct TurnClock {
    display: watch::Receiver<String>,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TurnClock {
    /// Start counting down from `limit`. Must be called inside a tokio runtime.
    pub fn start(limit: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, display) = watch::channel(format_clock(limit.as_millis() as u64));
        let task = tokio::spawn(run(limit, tx, stop.clone()));
        Self { display, stop, task }
    }

    /// Remaining time as `mm:ss`.
    pub fn remaining(&self) -> String {
        self.display.borrow().clone()
    }

    /// A receiver that sees every update.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.clone()
    }

    pub fn is_expired(&self) -> bool {
        self.task.is_finished() && !self.stop.load(Ordering::SeqCst)
    }

    /// Stop the countdown where it is.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for TurnClock {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

async fn run(limit: Duration, tx: watch::Sender<String>, stop: Arc<AtomicBool>) {
    let deadline = Instant::now() + limit;
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let left = deadline.saturating_duration_since(Instant::now());
        tx.send_replace(format_clock(left.as_millis() as u64));
        if left.is_zero() {
            return;
        }
    }
}
