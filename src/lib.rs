//! Telegram Forward Bot Library
//!
//! A Telegram userbot that republishes messages from a source group into a
//! destination group.
//!
//! This crate provides the core functionality for:
//! - Loading and validating configuration from the environment
//! - Connecting to Telegram via `MTProto`
//! - Cleaning links, mentions and channel plugs, then adding a reference and channel button
//! - Handling admin commands via private messages

pub mod commands;
pub mod config;
pub mod forwarder;
pub mod router;
pub mod telegram;
pub mod text;
