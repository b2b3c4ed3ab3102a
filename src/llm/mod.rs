//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Gemini / DeepSeek / Mock）

pub mod deepseek;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use gemini::{create_gemini_client, GEMINI_FLASH};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{LlmClient, LlmError};

use crate::config::AppConfig;

/// 按配置选择 LLM 后端；所选后端缺少 API Key 时退回 Mock（离线模式）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let model = cfg.llm.model.as_deref();

    match provider.as_str() {
        "gemini" if gemini::gemini_api_key().is_some() => {
            tracing::info!("Using Gemini LLM ({})", model.unwrap_or(GEMINI_FLASH));
            Arc::new(create_gemini_client(model))
        }
        "deepseek" if std::env::var("DEEPSEEK_API_KEY").is_ok() => {
            tracing::info!("Using DeepSeek LLM ({})", model.unwrap_or(DEEPSEEK_CHAT));
            Arc::new(create_deepseek_client(model))
        }
        "openai" if std::env::var("OPENAI_API_KEY").is_ok() => {
            let model = model.unwrap_or("gpt-4o-mini");
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                model,
                std::env::var("OPENAI_API_KEY").ok().as_deref(),
            ))
        }
        "mock" => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient)
        }
        other => {
            tracing::warn!(provider = %other, "No API key set or provider unknown, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}
