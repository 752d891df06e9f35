//! Cooperative timers with guaranteed cancellation.
//!
//! Every timer runs as a Tokio task owned by a [`TimerGuard`]. The task ends
//! when its callback breaks, when the guard is dropped, or when the
//! [`Lifetime`] it was started under is disposed, whichever comes first.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::lifecycle::Lifetime;

/// Owner of a running timer task. Dropping it aborts the task.
#[derive(Debug)]
pub struct TimerGuard {
    handle: JoinHandle<()>,
}

impl TimerGuard {
    /// Stop the timer now.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Call `tick` every `period` (first call after one period) until it breaks.
pub fn spawn_interval<F>(period: Duration, lifetime: &Lifetime, mut tick: F) -> TimerGuard
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let mut disposed = lifetime.subscribe();
    let already_disposed = lifetime.is_disposed();

    let handle = tokio::spawn(async move {
        if already_disposed {
            return;
        }
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if tick().is_break() {
                        break;
                    }
                }
                res = disposed.recv() => {
                    if !matches!(res, Err(broadcast::error::RecvError::Lagged(_))) {
                        break;
                    }
                }
            }
        }
    });

    TimerGuard { handle }
}

/// Second-resolution countdown (OTP resend cooldown, order expiry).
///
/// Disposing the lifetime finishes the countdown.
pub struct Countdown {
    remaining: watch::Receiver<u64>,
    lifetime: Lifetime,
    _guard: TimerGuard,
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl Countdown {
    /// Start counting down from `secs`.
    pub fn start(secs: u64, lifetime: &Lifetime) -> Self {
        let initial = if lifetime.is_disposed() { 0 } else { secs };
        let (tx, remaining) = watch::channel(initial);
        let guard = spawn_interval(Duration::from_secs(1), lifetime, move || {
            let mut left = 0;
            tx.send_modify(|r| {
                *r = r.saturating_sub(1);
                left = *r;
            });
            if left == 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        Self {
            remaining,
            lifetime: lifetime.clone(),
            _guard: guard,
        }
    }

    pub fn remaining(&self) -> u64 {
        if self.lifetime.is_disposed() {
            return 0;
        }
        *self.remaining.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Follow the remaining seconds.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }
}
