//! WebSage - Rust 对话机器人
//!
//! 模块划分：
//! - **agent**: 会话编排器（搜索判断、Prompt 组装、模型调用、历史记录）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与管线阶段
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Gemini / DeepSeek / Mock）
//! - **memory**: 会话内对话历史、上下文、工具调用日志
//! - **observability**: 日志初始化
//! - **tools**: 联网搜索（Provider 抽象 + DuckDuckGo）

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;

pub use agent::{Agent, AgentOptions, AgentReply};
