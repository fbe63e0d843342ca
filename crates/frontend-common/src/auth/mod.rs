//! Authentication module

pub mod context;
pub mod controller;
pub mod error_messages;

pub use context::{SessionAction, SessionContextData, SessionPhase};
pub use controller::{FormError, SessionController};
