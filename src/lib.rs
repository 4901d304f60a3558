// Public modules
pub mod accumulator;
pub mod chat;
pub mod connection;
pub mod controller;
pub mod error;
pub mod idle;
pub mod observability;
pub mod provision;
pub mod render;
pub mod types;

// Re-exports
pub use connection::{ConnectionEvent, ConnectionState, INIT_SENTINEL, SessionConnection};
pub use controller::{Controller, Outcome, Phase, SessionEvent};
pub use error::{Error, Result};
pub use idle::{DEFAULT_IDLE_WINDOW, IdleTimer};
pub use observability::register_biometrics;
pub use provision::{ProvisionClient, shareable_link};
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
