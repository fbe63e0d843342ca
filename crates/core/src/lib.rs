//! Portal core types and utilities

pub mod config;
pub mod error;
pub mod session;
pub mod state_dir;
pub mod types;

pub use config::{LoginEncoding, PortalConfig};
pub use error::{CoreError, CoreResult};
pub use session::{FileSessionStore, MemorySessionStore, SessionKey, SessionStore};
pub use state_dir::StateDir;
pub use types::{TokenPair, UserRecord};
