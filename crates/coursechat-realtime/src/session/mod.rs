//! Session lifecycle: authentication, room changes, chat, disconnect.

pub mod error;
pub mod manager;
pub mod state;

pub use error::SessionError;
pub use manager::SessionManager;
pub use state::{PresenceState, SharedPresence};
