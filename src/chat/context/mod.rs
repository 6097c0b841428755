mod message;
mod window;

pub use message::{ChatMessage, MessageRole, NewMessage, PersistedMessage};
pub use window::{ContextWindow, DEFAULT_SYSTEM_PROMPT, MAX_MESSAGES_PER_CHAT, WindowBuilder};
