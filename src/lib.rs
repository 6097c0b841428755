//! Chat relay: persists each question, replays a bounded window of the conversation to a
//! chat-completion service, persists the reply, and maps upstream failures onto a small set of
//! user-facing errors.

pub mod chat;
pub mod config;
pub mod relay;
pub mod utils;
