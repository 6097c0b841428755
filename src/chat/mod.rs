pub mod client;
pub mod context;
pub mod engine;
pub mod store;

pub use context::{ChatMessage, MessageRole};
