//! View-side session handling shared by the Portal clients

pub mod auth;
pub mod client;
pub mod config;
pub mod routes;

pub use auth::context::{SessionAction, SessionContextData, SessionPhase};
pub use auth::controller::{FormError, SessionController};
pub use client::{Gateways, create_gateways};
pub use config::ViewConfig;
pub use routes::Route;
