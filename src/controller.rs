//! The streaming chat session controller.
//!
//! [`Controller`] is a synchronous state machine: it owns the message log and
//! the pending assistant index, and consumes a closed set of tagged events
//! ([`SessionEvent`]) produced by the transport and the idle timer. Keeping
//! it free of I/O makes every transition testable with scripted event
//! sequences.
//!
//! Exactly one exchange is in flight at a time. The idle timer and the
//! transport's close/error race to finalize a turn; whichever arrives first
//! wins and the loser is a no-op.

use crate::accumulator;
use crate::error::{Error, Result};
use crate::observability::{EXCHANGE_CLOSE_FINALIZES, EXCHANGE_IDLE_FINALIZES};
use crate::types::{MessageLog, Turn};

/// Lifecycle phase of the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No exchange in flight; ready to accept a submission.
    Idle,
    /// A submission was accepted; the connection is not yet open.
    AwaitingOpen,
    /// The conversation was sent; fragments may arrive.
    Streaming,
    /// The last exchange ended with a transport failure. A new submission is
    /// still accepted; failure is not sticky.
    Failed,
}

impl Phase {
    /// Returns true if an exchange is currently in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::AwaitingOpen | Phase::Streaming)
    }
}

/// The closed set of events that drive the controller.
#[derive(Debug)]
pub enum SessionEvent {
    /// The connection reached its open state.
    Opened,
    /// A content fragment arrived (sentinels are filtered by the transport).
    Fragment(String),
    /// The idle window elapsed with no fragment.
    IdleExpired,
    /// The transport finished cleanly.
    Closed,
    /// The transport failed.
    Errored(Error),
}

/// How a turn was finalized, reported by [`Controller::handle_event`] so the
/// driver can react (stop the timer, close the connection, surface an error).
#[derive(Debug)]
pub enum Outcome {
    /// The event did not finalize the exchange.
    Continue,
    /// The exchange finalized cleanly (idle expiry or transport close).
    Finished,
    /// The exchange finalized with a transport failure.
    Failed(Error),
}

/// Orchestrates one streaming exchange at a time over the message log.
#[derive(Debug, Default)]
pub struct Controller {
    log: MessageLog,
    phase: Phase,
    pending: Option<usize>,
    loading: bool,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl Controller {
    /// Creates a controller with an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a user submission and moves to `AwaitingOpen`.
    ///
    /// Rejected with a busy error while an exchange is in flight; the log is
    /// left untouched by a rejected call. Accepted from both `Idle` and
    /// `Failed`.
    pub fn begin_exchange(&mut self, user_text: &str) -> Result<()> {
        if self.phase.is_busy() {
            return Err(Error::busy("an exchange is already in flight"));
        }
        self.log.push_user(user_text);
        self.pending = None;
        self.loading = true;
        self.phase = Phase::AwaitingOpen;
        Ok(())
    }

    /// Feeds one event through the state machine.
    ///
    /// Finalization is idempotent: once the exchange has finalized, further
    /// `IdleExpired`, `Closed`, and `Errored` events are no-ops and report
    /// [`Outcome::Continue`], so no duplicate completion or error
    /// notification can be produced.
    pub fn handle_event(&mut self, event: SessionEvent) -> Outcome {
        match event {
            SessionEvent::Opened => {
                if self.phase == Phase::AwaitingOpen {
                    self.phase = Phase::Streaming;
                }
                Outcome::Continue
            }
            SessionEvent::Fragment(text) => {
                if self.phase == Phase::Streaming {
                    self.pending = Some(accumulator::accept(&mut self.log, self.pending, &text));
                }
                Outcome::Continue
            }
            SessionEvent::IdleExpired => {
                if self.finalize(Phase::Idle) {
                    EXCHANGE_IDLE_FINALIZES.click();
                    Outcome::Finished
                } else {
                    Outcome::Continue
                }
            }
            SessionEvent::Closed => {
                if self.finalize(Phase::Idle) {
                    EXCHANGE_CLOSE_FINALIZES.click();
                    Outcome::Finished
                } else {
                    Outcome::Continue
                }
            }
            SessionEvent::Errored(cause) => {
                if self.finalize(Phase::Failed) {
                    // Partial assistant text stays in the log; a partial
                    // answer still carries user value.
                    Outcome::Failed(cause)
                } else {
                    Outcome::Continue
                }
            }
        }
    }

    /// Clears the pending index and loading flag; returns false if the
    /// exchange was already finalized.
    fn finalize(&mut self, next: Phase) -> bool {
        if !self.phase.is_busy() {
            return false;
        }
        self.pending = None;
        self.loading = false;
        self.phase = next;
        true
    }

    /// Returns the conversation log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Returns the turns in conversation order.
    pub fn turns(&self) -> &[Turn] {
        self.log.turns()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true while an exchange is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Position of the turn currently receiving fragments, if any.
    pub fn pending_index(&self) -> Option<usize> {
        self.pending
    }

    /// Per-turn "still streaming" flag for renderers: true only for the
    /// in-progress assistant turn while the session is loading.
    pub fn is_streaming_turn(&self, index: usize) -> bool {
        self.loading && self.pending == Some(index)
    }

    /// Discards the conversation. Only meaningful between exchanges.
    pub fn clear(&mut self) {
        debug_assert!(!self.phase.is_busy());
        self.log.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_controller() -> Controller {
        let mut c = Controller::new();
        c.begin_exchange("hi").unwrap();
        assert!(matches!(c.handle_event(SessionEvent::Opened), Outcome::Continue));
        c
    }

    #[test]
    fn begin_exchange_appends_user_turn() {
        let mut c = Controller::new();
        c.begin_exchange("hello").unwrap();
        assert_eq!(c.turns().len(), 1);
        assert_eq!(c.turns()[0].text, "hello");
        assert!(c.is_loading());
        assert_eq!(c.phase(), Phase::AwaitingOpen);
        assert!(c.pending_index().is_none());
    }

    #[test]
    fn second_submission_rejected_while_busy() {
        let mut c = streaming_controller();
        let err = c.begin_exchange("again").unwrap_err();
        assert!(err.is_busy());
        // The rejected call must not have touched the log.
        assert_eq!(c.turns().len(), 1);
        assert_eq!(c.phase(), Phase::Streaming);
    }

    #[test]
    fn fragments_accumulate_into_one_assistant_turn() {
        let mut c = streaming_controller();
        for fragment in ["Hel", "lo, ", "world"] {
            c.handle_event(SessionEvent::Fragment(fragment.to_string()));
        }
        assert_eq!(c.turns().len(), 2);
        assert_eq!(c.turns()[1].text, "Hello, world");
        assert_eq!(c.pending_index(), Some(1));
        assert!(c.is_streaming_turn(1));
        assert!(!c.is_streaming_turn(0));
    }

    #[test]
    fn idle_expiry_finalizes_to_idle() {
        let mut c = streaming_controller();
        c.handle_event(SessionEvent::Fragment("done".to_string()));
        assert!(matches!(c.handle_event(SessionEvent::IdleExpired), Outcome::Finished));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.is_loading());
        assert!(c.pending_index().is_none());
        assert!(!c.is_streaming_turn(1));
    }

    #[test]
    fn zero_fragment_idle_expiry_leaves_log_unchanged() {
        let mut c = streaming_controller();
        assert!(matches!(c.handle_event(SessionEvent::IdleExpired), Outcome::Finished));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.is_loading());
        // Only the user turn; the sentinel never created an assistant turn.
        assert_eq!(c.turns().len(), 1);
    }

    #[test]
    fn error_retains_partial_text_and_allows_resubmit() {
        let mut c = streaming_controller();
        c.handle_event(SessionEvent::Fragment("Hel".to_string()));
        c.handle_event(SessionEvent::Fragment("lo".to_string()));
        let outcome = c.handle_event(SessionEvent::Errored(Error::transport(
            "connection reset",
            None,
        )));
        match outcome {
            Outcome::Failed(err) => assert!(err.is_transport()),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(c.phase(), Phase::Failed);
        assert_eq!(c.turns()[1].text, "Hello");
        assert!(!c.is_loading());

        // Failure is not sticky.
        c.begin_exchange("try again").unwrap();
        assert_eq!(c.phase(), Phase::AwaitingOpen);
        assert_eq!(c.turns().len(), 3);
    }

    #[test]
    fn finalization_is_idempotent() {
        let mut c = streaming_controller();
        assert!(matches!(c.handle_event(SessionEvent::IdleExpired), Outcome::Finished));
        // A racing close after the timer already fired must be a no-op.
        assert!(matches!(c.handle_event(SessionEvent::Closed), Outcome::Continue));
        assert!(matches!(c.handle_event(SessionEvent::IdleExpired), Outcome::Continue));
        let outcome = c.handle_event(SessionEvent::Errored(Error::transport("late", None)));
        assert!(matches!(outcome, Outcome::Continue));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn fragments_ignored_before_streaming() {
        let mut c = Controller::new();
        c.begin_exchange("hi").unwrap();
        c.handle_event(SessionEvent::Fragment("early".to_string()));
        assert_eq!(c.turns().len(), 1);
        assert!(c.pending_index().is_none());
    }

    #[test]
    fn error_before_open_moves_to_failed() {
        let mut c = Controller::new();
        c.begin_exchange("hi").unwrap();
        let outcome = c.handle_event(SessionEvent::Errored(Error::connection(
            "unreachable",
            None,
        )));
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(c.phase(), Phase::Failed);
        assert!(!c.is_loading());
    }

    #[test]
    fn clear_resets_conversation() {
        let mut c = streaming_controller();
        c.handle_event(SessionEvent::Fragment("hello".to_string()));
        c.handle_event(SessionEvent::Closed);
        c.clear();
        assert!(c.turns().is_empty());
        assert!(c.pending_index().is_none());
    }
}
