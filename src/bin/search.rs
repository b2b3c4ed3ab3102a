//! 搜索冒烟测试：对一个查询跑一次 async_search，打印原始结果与格式化文本
//!
//! 启动: cargo run --bin websage-search -- "What is the capital of France?"

use std::sync::Arc;

use anyhow::Context;
use websage::config::{load_config, AppConfig};
use websage::observability;
use websage::tools::{DuckDuckGoProvider, SearchClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|_| AppConfig::default());
    let query = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let query = if query.trim().is_empty() {
        "What is the capital of France?".to_string()
    } else {
        query
    };

    let provider = DuckDuckGoProvider::new(cfg.search.endpoint.clone(), cfg.search.timeout_secs)
        .context("Failed to build search client")?;
    let client = SearchClient::new(Arc::new(provider));

    let results = client.async_search(&query, cfg.search.max_results).await;

    println!("Search query: {}", query);
    println!("Raw results:");
    println!(
        "{}",
        serde_json::to_string_pretty(&results).context("Failed to serialize results")?
    );
    println!("Formatted results:");
    println!("{}", SearchClient::format_results(&results));

    Ok(())
}
