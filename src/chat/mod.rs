//! Chat application module for conversing with a remote assistant.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! dmchat client library. It supports:
//!
//! - Streaming replies with real-time fragment display
//! - Provisioning a new chat identity and printing its shareable link
//! - Slash commands for session control
//! - Configurable endpoint, session handle, and idle window
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Chat session driver tying the controller to the transport
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ACCESS_KEY_ENV, ChatArgs, ChatConfig, ENDPOINT_ENV};
pub use session::{ChatSession, SessionStats};
