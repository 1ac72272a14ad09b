//! Telegram client module.
//!
//! [`Transport`] is the seam the forwarding pipeline and the admin handler
//! talk to; [`TelegramBot`] implements it on top of grammers, including
//! authentication, dialog-based chat resolution and send pacing.
//! [`UpdateBackoff`] paces retries when the update stream keeps failing.

mod backoff;
mod client;
mod rate_limiter;
mod transport;

pub use backoff::{UPDATE_MAX_FAILURES, UpdateBackoff};
pub use client::{LoginToken, PasswordToken, SignIn, TelegramBot, TelegramError, UpdateFeed};
pub use rate_limiter::RateLimiter;
pub use transport::{AccountInfo, InboundMessage, Transport};
