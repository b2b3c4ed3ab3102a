//! Google Gemini 客户端（走 Gemini 的 OpenAI 兼容端点）
//!
//! - Base URL: https://generativelanguage.googleapis.com/v1beta/openai
//! - API Key: 环境变量 `GOOGLE_API_KEY`（兼容 `GEMINI_API_KEY`）

use crate::llm::OpenAiClient;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const GEMINI_FLASH: &str = "gemini-2.0-flash";

/// 读取 Gemini API Key
pub fn gemini_api_key() -> Option<String> {
    std::env::var("GOOGLE_API_KEY")
        .ok()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
}

/// 创建 Gemini 客户端；模型未指定时使用 `gemini-2.0-flash`
pub fn create_gemini_client(model: Option<&str>) -> OpenAiClient {
    let api_key = gemini_api_key().unwrap_or_else(|| "placeholder".to_string());
    let model = model.unwrap_or(GEMINI_FLASH);
    OpenAiClient::new(Some(GEMINI_BASE_URL), model, Some(api_key.as_str()))
}
