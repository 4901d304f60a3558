//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;
use url::Url;

use crate::error::{Error, Result};
use crate::idle::DEFAULT_IDLE_WINDOW;
use crate::types::SessionHandle;

/// Default backend endpoint when neither the flag nor the environment
/// variable provides one.
const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Environment variable consulted for the backend endpoint.
pub const ENDPOINT_ENV: &str = "DMCHAT_ENDPOINT";

/// Environment variable consulted for the provisioning access key.
pub const ACCESS_KEY_ENV: &str = "DMCHAT_ACCESS_KEY";

/// Command-line arguments for the dmchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend endpoint.
    #[arrrg(optional, "Backend endpoint (default: http://localhost:8000)", "URL")]
    pub endpoint: Option<String>,

    /// Session handle to chat with.
    #[arrrg(optional, "Session handle of the identity to chat with", "ID")]
    pub session: Option<String>,

    /// Access key for provisioning a new identity.
    #[arrrg(optional, "Access key for provisioning", "KEY")]
    pub access_key: Option<String>,

    /// Base URL used when printing shareable links.
    #[arrrg(optional, "Base URL for shareable links (default: endpoint)", "URL")]
    pub share_base: Option<String>,

    /// Quiet window before a streamed reply is considered complete.
    #[arrrg(optional, "Idle completion window in milliseconds (default: 3000)", "MS")]
    pub idle_ms: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The backend endpoint both calls are addressed to.
    pub endpoint: Url,

    /// Base URL for shareable links.
    pub share_base: Url,

    /// The session handle to chat with, if one is configured.
    pub session: Option<SessionHandle>,

    /// Access key for provisioning, if one is configured.
    pub access_key: Option<String>,

    /// Quiet window before a streamed reply is considered complete.
    pub idle_window: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: http://localhost:8000
    /// - Idle window: 3000 ms
    /// - Color: enabled
    pub fn new() -> Self {
        let endpoint = Url::parse(DEFAULT_ENDPOINT).expect("default endpoint parses");
        Self {
            share_base: endpoint.clone(),
            endpoint,
            session: None,
            access_key: None,
            idle_window: DEFAULT_IDLE_WINDOW,
            use_color: true,
        }
    }

    /// Sets the backend endpoint.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the session handle.
    pub fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets the access key.
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Sets the idle completion window.
    pub fn with_idle_window(mut self, window: Duration) -> Self {
        self.idle_window = window;
        self
    }

    /// Resolves command-line arguments and the environment into a config.
    ///
    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(args: ChatArgs) -> Result<Self> {
        let endpoint = args
            .endpoint
            .or_else(|| std::env::var(ENDPOINT_ENV).ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::validation(format!("bad endpoint: {e}"), Some("endpoint".to_string())))?;
        let share_base = match args.share_base {
            Some(base) => Url::parse(&base).map_err(|e| {
                Error::validation(format!("bad share base: {e}"), Some("share-base".to_string()))
            })?,
            None => endpoint.clone(),
        };
        let access_key = args
            .access_key
            .or_else(|| std::env::var(ACCESS_KEY_ENV).ok());
        Ok(Self {
            endpoint,
            share_base,
            session: args.session.map(SessionHandle::new),
            access_key,
            idle_window: args
                .idle_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_IDLE_WINDOW),
            use_color: !args.no_color,
        })
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChatConfig::new();
        assert_eq!(config.endpoint.as_str(), "http://localhost:8000/");
        assert_eq!(config.idle_window, Duration::from_millis(3000));
        assert!(config.use_color);
        assert!(config.session.is_none());
    }

    #[test]
    fn resolve_applies_flags() {
        let args = ChatArgs {
            endpoint: Some("https://chat.example.com/api".to_string()),
            session: Some("66a1f00d".to_string()),
            access_key: Some("key".to_string()),
            share_base: None,
            idle_ms: Some(500),
            no_color: true,
        };
        let config = ChatConfig::resolve(args).unwrap();
        assert_eq!(config.endpoint.as_str(), "https://chat.example.com/api");
        assert_eq!(config.session, Some(SessionHandle::new("66a1f00d")));
        assert_eq!(config.idle_window, Duration::from_millis(500));
        assert!(!config.use_color);
        // Share base falls back to the endpoint.
        assert_eq!(config.share_base, config.endpoint);
    }

    #[test]
    fn resolve_rejects_bad_endpoint() {
        let args = ChatArgs {
            endpoint: Some("not a url".to_string()),
            ..ChatArgs::default()
        };
        let err = ChatConfig::resolve(args).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn builders() {
        let config = ChatConfig::new()
            .with_session(SessionHandle::new("abc"))
            .with_access_key("key")
            .with_idle_window(Duration::from_millis(100));
        assert_eq!(config.session, Some(SessionHandle::new("abc")));
        assert_eq!(config.access_key.as_deref(), Some("key"));
        assert_eq!(config.idle_window, Duration::from_millis(100));
    }
}
