//! Repbot — a rep-counting conversational bot.

pub mod config;
pub mod convo;
pub mod error;
pub mod transport;
