//! Handlers for the inbound update kinds the bot acts on.

pub mod approval;
pub mod command;
