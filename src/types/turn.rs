use serde::{Deserialize, Serialize};

/// Role type for a conversation turn.
///
/// Serialized with the wire protocol's field values (`"user"` /
/// `"assistant"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// One message in the conversation, attributed to either the user or the
/// assistant.
///
/// The wire protocol names the fields `sender` and `content`; the Rust-facing
/// names are `role` and `text`. While a turn is the active assistant turn its
/// text grows by appended fragments; once finalized it is never touched
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    #[serde(rename = "sender")]
    pub role: Role,

    /// The UTF-8 content of the turn.
    #[serde(rename = "content")]
    pub text: String,
}

impl Turn {
    /// Create a new `Turn` with the given role and text.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a new user `Turn`.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new assistant `Turn`.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Returns true if this turn was produced by the assistant.
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

impl From<&str> for Turn {
    fn from(text: &str) -> Self {
        Self::user(text)
    }
}

impl From<String> for Turn {
    fn from(text: String) -> Self {
        Self::user(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_turn_wire_form() {
        let turn = Turn::user("Hello!");
        let json = to_value(&turn).unwrap();

        assert_eq!(
            json,
            json!({
                "sender": "user",
                "content": "Hello!"
            })
        );
    }

    #[test]
    fn assistant_turn_wire_form() {
        let turn = Turn::assistant("Hi there.");
        let json = to_value(&turn).unwrap();

        assert_eq!(
            json,
            json!({
                "sender": "assistant",
                "content": "Hi there."
            })
        );
    }

    #[test]
    fn turn_deserialization() {
        let json = json!({
            "sender": "assistant",
            "content": "Hello from the other side"
        });

        let turn: Turn = serde_json::from_value(json).unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.text, "Hello from the other side");
        assert!(turn.is_assistant());
    }

    #[test]
    fn turn_from_str_is_user() {
        let turn: Turn = "Hello".into();
        assert_eq!(turn.role, Role::User);
    }
}
