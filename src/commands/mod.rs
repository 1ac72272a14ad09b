//! Admin command handling.
//!
//! Commands arrive as private messages and are only honored when they come
//! from the configured admin user. Replies go to the admin's private chat.

mod handler;
mod types;

pub use handler::{AdminHandler, format_duration};
pub use types::{AdminCommand, CommandResult};
