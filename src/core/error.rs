//! Agent 错误类型与对外的回复错误标签
//!
//! 管线内部统一返回 `Result<_, AgentError>`；在 `Agent::process_message` 边界转为 ReplyError，
//! 不向调用方抛出。

use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

/// 消息处理管线中可能出现的错误（搜索失败已在局部消化，不在此列）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// 错误类别（稳定标签，供程序化调用方分支）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelInvocation,
    Configuration,
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Llm(_) => ErrorKind::ModelInvocation,
            AgentError::ConfigError(_) => ErrorKind::Configuration,
        }
    }
}

/// 回复中携带的错误：类别 + 可读原因
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl From<&AgentError> for ReplyError {
    fn from(err: &AgentError) -> Self {
        Self {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}
