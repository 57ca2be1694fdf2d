#![forbid(unsafe_code)]

//! Approval-gated Telegram notification bot.
//!
//! Announces financial records and supply requests to admin chats and lets
//! admins approve or reject records with inline buttons.

pub mod approval;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod server;
pub mod state;
pub mod telegram;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
