//! 记忆层：会话内对话历史、上下文与工具调用日志（仅进程内）

pub mod conversation;

pub use conversation::{ConversationMemory, Message, Role, ToolInvocationRecord};
