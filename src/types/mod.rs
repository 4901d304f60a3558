// Public modules
pub mod log;
pub mod session_handle;
pub mod turn;
pub mod wire;

// Re-exports
pub use log::MessageLog;
pub use session_handle::SessionHandle;
pub use turn::{Role, Turn};
pub use wire::{ConversationPayload, ProvisionRequest, ProvisionResponse};
