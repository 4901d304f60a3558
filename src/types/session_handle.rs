use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of the remote chat configuration this session talks to.
///
/// Handles come from the provisioning call or a shared link and are immutable
/// for the lifetime of the session. The client never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Creates a handle from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionHandle {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for SessionHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_as_plain_string() {
        let handle = SessionHandle::new("66a1f00d");
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "\"66a1f00d\"");
        let back: SessionHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn display_matches_contents() {
        let handle: SessionHandle = "abc123".parse().unwrap();
        assert_eq!(handle.to_string(), "abc123");
    }
}
