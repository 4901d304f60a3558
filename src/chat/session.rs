//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which ties the synchronous
//! [`Controller`] state machine to the WebSocket transport and the idle
//! timer, driving one streaming exchange at a time.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use crate::chat::config::ChatConfig;
use crate::connection::{ConnectionEvent, SessionConnection};
use crate::controller::{Controller, Outcome, SessionEvent};
use crate::error::{Error, Result};
use crate::idle::IdleTimer;
use crate::observability::EXCHANGE_DURATION;
use crate::render::Renderer;
use crate::types::{SessionHandle, Turn};

/// A chat session that manages conversation state and the streaming
/// transport.
///
/// The session holds the message log (via its controller) and drives one
/// exchange per [`ChatSession::submit`] call: connect, send the full
/// conversation, stream fragments through the renderer, and finalize on idle
/// expiry, close, interrupt, or error.
pub struct ChatSession {
    config: ChatConfig,
    controller: Controller,
    exchange_count: u64,
    failure_count: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The backend endpoint.
    pub endpoint: String,
    /// The session handle, if configured.
    pub session: Option<String>,
    /// The number of turns in the conversation.
    pub message_count: usize,
    /// The idle completion window, in milliseconds.
    pub idle_window_ms: u64,
    /// Total exchanges attempted.
    pub exchanges: u64,
    /// Exchanges that ended in a transport failure.
    pub failures: u64,
}

impl ChatSession {
    /// Creates a new chat session from a configuration.
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            controller: Controller::new(),
            exchange_count: 0,
            failure_count: 0,
        }
    }

    /// Submits a user message and streams the reply.
    ///
    /// This method:
    /// 1. Appends the user turn to the conversation
    /// 2. Opens a streaming connection for this exchange
    /// 3. Sends the full conversation-so-far as one framed message
    /// 4. Renders fragments as they arrive, until the idle window elapses,
    ///    the transport closes, the user interrupts, or the transport fails
    ///
    /// Only one exchange may be in flight at a time; a concurrent call is
    /// rejected with a busy error and leaves the conversation untouched.
    /// Transport failures are surfaced exactly once as the returned error;
    /// partial reply text already received is retained, and a subsequent
    /// `submit` is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if no session handle is configured, the message is
    /// empty, an exchange is in flight, or the transport fails.
    pub async fn submit(
        &mut self,
        user_text: &str,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(Error::validation(
                "message must not be empty",
                Some("user_text".to_string()),
            ));
        }
        let Some(handle) = self.config.session.clone() else {
            return Err(Error::no_session(
                "configure a session with /session or /provision first",
            ));
        };

        self.controller.begin_exchange(user_text)?;
        self.exchange_count += 1;
        let started = Instant::now();
        let result = self.drive_exchange(&handle, renderer, interrupted).await;
        EXCHANGE_DURATION.add(started.elapsed().as_secs_f64());
        if result.is_err() {
            self.failure_count += 1;
        }
        result
    }

    async fn drive_exchange(
        &mut self,
        handle: &SessionHandle,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        use std::sync::atomic::Ordering;

        let mut conn = match SessionConnection::open(&self.config.endpoint, handle).await {
            Ok(conn) => conn,
            Err(err) => {
                self.controller
                    .handle_event(SessionEvent::Errored(err.clone()));
                return Err(err);
            }
        };
        self.controller.handle_event(SessionEvent::Opened);

        if let Err(err) = conn.send_conversation(self.controller.log()).await {
            self.controller
                .handle_event(SessionEvent::Errored(err.clone()));
            return Err(err);
        }

        // The quiet window starts counting as soon as streaming begins, so
        // an exchange with zero fragments still completes.
        let mut timer = IdleTimer::new(self.config.idle_window);
        timer.reset();

        // The flag is re-checked on every tick so a Ctrl+C during a quiet
        // stream is observed promptly, not at the next fragment.
        let mut interrupt_poll = tokio::time::interval(Duration::from_millis(50));

        loop {
            if interrupted.load(Ordering::Relaxed) || renderer.should_interrupt() {
                timer.cancel();
                conn.close().await;
                self.controller.handle_event(SessionEvent::Closed);
                renderer.print_interrupted();
                return Ok(());
            }
            tokio::select! {
                event = conn.next_event() => match event {
                    ConnectionEvent::Fragment(text) => {
                        timer.reset();
                        renderer.print_text(&text);
                        self.controller.handle_event(SessionEvent::Fragment(text));
                    }
                    ConnectionEvent::Closed => {
                        timer.cancel();
                        self.controller.handle_event(SessionEvent::Closed);
                        renderer.finish_response();
                        return Ok(());
                    }
                    ConnectionEvent::Errored(err) => {
                        timer.cancel();
                        match self.controller.handle_event(SessionEvent::Errored(err)) {
                            Outcome::Failed(err) => return Err(err),
                            _ => return Ok(()),
                        }
                    }
                },
                _ = timer.expired() => {
                    self.controller.handle_event(SessionEvent::IdleExpired);
                    conn.close().await;
                    renderer.finish_response();
                    return Ok(());
                }
                _ = interrupt_poll.tick() => {}
            }
        }
    }

    /// Sets or replaces the session handle.
    pub fn set_session_handle(&mut self, handle: SessionHandle) {
        self.config.session = Some(handle);
    }

    /// Returns the configured session handle, if any.
    pub fn session_handle(&self) -> Option<&SessionHandle> {
        self.config.session.as_ref()
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the turns in conversation order.
    pub fn turns(&self) -> &[Turn] {
        self.controller.turns()
    }

    /// Returns the number of turns in the conversation.
    pub fn message_count(&self) -> usize {
        self.controller.turns().len()
    }

    /// Returns true while an exchange is in flight.
    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.controller.clear();
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            endpoint: self.config.endpoint.to_string(),
            session: self.config.session.as_ref().map(|s| s.to_string()),
            message_count: self.message_count(),
            idle_window_ms: self.config.idle_window.as_millis() as u64,
            exchanges: self.exchange_count,
            failures: self.failure_count,
        }
    }
}
