use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tubeq_logging::tubeq_debug;

/// Single repeating timer. At most one loop runs per timer; starting a
/// running timer does nothing.
pub struct PollTimer {
    interval: Duration,
    token: Option<CancellationToken>,
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Spawns the loop on `handle`. `on_tick` receives the 1-based tick
    /// number; the first tick fires immediately. Returns false if a loop was
    /// already running.
    pub fn start<F>(&mut self, handle: &Handle, on_tick: F) -> bool
    where
        F: Fn(u64) + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.interval;
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick = 0u64;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        tick += 1;
                        on_tick(tick);
                    }
                }
            }
            tubeq_debug!("Poll loop ended after {} tick(s)", tick);
        });
        self.token = Some(token);
        true
    }

    /// Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.token.take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn start_is_idempotent_and_stop_halts_ticks() {
        let mut timer = PollTimer::new(Duration::from_millis(10));
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();

        assert!(timer.start(&Handle::current(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!timer.start(&Handle::current(), |_| {}));
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(timer.stop());
        assert!(!timer.stop());
        assert!(!timer.is_running());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn restart_after_stop_counts_from_one() {
        let mut timer = PollTimer::new(Duration::from_millis(5));
        let (tx, rx) = std::sync::mpsc::channel();
        let first = tx.clone();
        timer.start(&Handle::current(), move |tick| {
            let _ = first.send(("first", tick));
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        timer.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        while rx.try_recv().is_ok() {}

        timer.start(&Handle::current(), move |tick| {
            let _ = tx.send(("second", tick));
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        timer.stop();

        let (label, tick) = rx.try_recv().expect("tick after restart");
        assert_eq!(label, "second");
        assert_eq!(tick, 1);
    }
}
