//! Idle-completion timer.
//!
//! The wire protocol carries no explicit end-of-turn marker, so completion is
//! inferred from a quiet window: if no fragment arrives for the configured
//! duration, the in-progress turn is treated as complete. This is a
//! heuristic, not a guarantee. The timer is a single-shot deadline owned by
//! the exchange driver; rearming cancels any previously scheduled firing, so
//! at most one expiry is ever observed per arming.

use std::time::Duration;

use tokio::time::Instant;

/// Quiet window after which the in-progress assistant turn is considered
/// complete.
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_millis(3000);

/// Single-shot idle deadline.
#[derive(Debug)]
pub struct IdleTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl IdleTimer {
    /// Creates a disarmed timer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// (Re)arms the deadline `window` from now.
    ///
    /// Any previously scheduled firing is superseded. Called when streaming
    /// begins and once per received fragment.
    pub fn reset(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Disarms the timer without firing; called on explicit close or error.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true if a deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns the configured quiet window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Completes when the armed deadline passes; pends forever while
    /// disarmed. Intended for use in a `tokio::select!` arm.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => futures::future::pending().await,
        }
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_quiet_window() {
        let mut timer = IdleTimer::new(Duration::from_millis(3000));
        timer.reset();

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(
            futures::poll!(std::pin::pin!(timer.expired())).is_pending(),
            "must not fire before the window elapses"
        );

        tokio::time::advance(Duration::from_millis(2)).await;
        timer.expired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reset_supersedes_previous_deadline() {
        let mut timer = IdleTimer::new(Duration::from_millis(3000));
        timer.reset();

        tokio::time::advance(Duration::from_millis(2000)).await;
        timer.reset();
        tokio::time::advance(Duration::from_millis(2000)).await;

        // 4000ms since the first arming, 2000ms since the second.
        assert!(futures::poll!(std::pin::pin!(timer.expired())).is_pending());

        tokio::time::advance(Duration::from_millis(1001)).await;
        timer.expired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let mut timer = IdleTimer::new(Duration::from_millis(10));
        timer.reset();
        timer.cancel();
        assert!(!timer.is_armed());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(futures::poll!(std::pin::pin!(timer.expired())).is_pending());
    }

    #[test]
    fn default_window_is_three_seconds() {
        let timer = IdleTimer::default();
        assert_eq!(timer.window(), Duration::from_millis(3000));
        assert!(!timer.is_armed());
    }
}
