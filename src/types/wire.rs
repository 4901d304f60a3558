//! Wire types for the streaming endpoint and the provisioning call.

use serde::{Deserialize, Serialize};

use crate::types::{MessageLog, Turn};

/// The single framed message sent after the connection becomes ready: the
/// entire conversation so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPayload {
    /// The full ordered conversation.
    pub messages: Vec<Turn>,
}

impl ConversationPayload {
    /// Snapshots a log into an outbound payload.
    pub fn from_log(log: &MessageLog) -> Self {
        Self {
            messages: log.turns().to_vec(),
        }
    }
}

/// Request body for the provisioning call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    /// Optional behavioral prompt attached to the provisioned identity.
    pub custom_prompt: Option<String>,
}

/// Response body from the provisioning call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionResponse {
    /// Whether provisioning succeeded.
    #[serde(default)]
    pub success: bool,

    /// The session handle for the newly provisioned identity.
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
}
