//! Mock LLM 客户端（离线 / 测试用，无需 API）
//!
//! 取 Prompt 中最后一行 `User query:`，回显为固定格式的回复。

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

const QUERY_MARKER: &str = "User query: ";

/// Mock 客户端：回显最后一条用户问题
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let query = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(QUERY_MARKER))
            .unwrap_or("(no input)");

        Ok(format!("Echo from Mock: {}", query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_last_query() {
        let prompt = "system\n\nUser query: first\nUSER: noise\n\nUser query: second";
        let reply = MockLlmClient.complete(prompt).await.unwrap();
        assert_eq!(reply, "Echo from Mock: second");
    }

    #[tokio::test]
    async fn test_without_query_marker() {
        let reply = MockLlmClient.complete("nothing here").await.unwrap();
        assert_eq!(reply, "Echo from Mock: (no input)");
    }
}
