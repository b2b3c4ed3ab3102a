//! 搜索客户端：调用 SearchProvider，统一结果结构并格式化为 Prompt 文本
//!
//! Provider 返回的原始记录字段可能缺失，逐条映射为 {title, link, snippet}；
//! 单条映射失败跳过并记日志，Provider 整体失败时返回仅含一个错误元素的列表（不返回 Err）。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;

/// 默认返回条数
pub const DEFAULT_MAX_RESULTS: usize = 5;

const NO_TITLE: &str = "No title";
const NO_LINK: &str = "No link";
const NO_SNIPPET: &str = "No snippet";

/// 搜索服务失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// 搜索服务能力：query → 原始记录列表（JSON 对象，字段不保证存在）
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Value>, SearchError>;
}

/// 统一后的搜索结果；错误通过数据通道传递
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResult {
    Error {
        error: String,
    },
    Hit {
        title: String,
        link: String,
        snippet: String,
    },
}

impl SearchResult {
    pub fn hit(title: impl Into<String>, link: impl Into<String>, snippet: impl Into<String>) -> Self {
        SearchResult::Hit {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        SearchResult::Error {
            error: error.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SearchResult::Error { .. })
    }
}

/// 取第一个存在的字段；null 视为缺失，非字符串视为映射失败
fn string_field(
    record: &serde_json::Map<String, Value>,
    keys: &[&str],
    placeholder: &str,
) -> Result<String, String> {
    for key in keys {
        match record.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return Ok(s.clone()),
            Some(other) => return Err(format!("field `{}` is not a string: {}", key, other)),
        }
    }
    Ok(placeholder.to_string())
}

/// 将一条原始记录映射为 SearchResult::Hit
fn normalize_record(raw: &Value) -> Result<SearchResult, String> {
    let record = raw
        .as_object()
        .ok_or_else(|| format!("expected an object, got {}", raw))?;

    Ok(SearchResult::Hit {
        title: string_field(record, &["title"], NO_TITLE)?,
        link: string_field(record, &["href", "link"], NO_LINK)?,
        snippet: string_field(record, &["body", "snippet"], NO_SNIPPET)?,
    })
}

/// 搜索客户端：持有 Provider，可克隆（内部 Arc）
#[derive(Clone)]
pub struct SearchClient {
    provider: Arc<dyn SearchProvider>,
}

impl SearchClient {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// 执行搜索并统一结果结构；永不返回 Err，失败体现为错误元素
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let records = match self.provider.fetch(query, max_results).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "search failed");
                return vec![SearchResult::error(format!("Search failed: {}", e))];
            }
        };

        tracing::debug!(query = %query, count = records.len(), "search raw results");

        records
            .iter()
            .filter_map(|raw| match normalize_record(raw) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed search result");
                    None
                }
            })
            .collect()
    }

    /// 在独立任务中执行搜索，立即返回可 await 的句柄；句柄丢弃时任务被取消
    pub fn async_search(&self, query: &str, max_results: usize) -> SearchHandle {
        let client = self.clone();
        let query = query.to_string();
        SearchHandle {
            inner: tokio::spawn(async move { client.search(&query, max_results).await }),
        }
    }

    /// 格式化为 Prompt / 展示文本
    ///
    /// - 空列表：`No results found.`
    /// - 遇到第一个错误元素即返回 `Error: <message>`，其余结果丢弃
    /// - 否则为编号列表：标题、`   Link: ...`、`   摘要`，条目间空行
    pub fn format_results(results: &[SearchResult]) -> String {
        if results.is_empty() {
            return "No results found.".to_string();
        }

        let mut formatted = Vec::with_capacity(results.len() * 3);
        for (i, result) in results.iter().enumerate() {
            match result {
                SearchResult::Error { error } => return format!("Error: {}", error),
                SearchResult::Hit {
                    title,
                    link,
                    snippet,
                } => {
                    formatted.push(format!("{}. {}", i + 1, title));
                    formatted.push(format!("   Link: {}", link));
                    formatted.push(format!("   {}\n", snippet));
                }
            }
        }
        formatted.join("\n")
    }
}

/// `async_search` 返回的句柄；await 得到与 `search` 相同的结果
pub struct SearchHandle {
    inner: JoinHandle<Vec<SearchResult>>,
}

impl SearchHandle {
    pub fn abort(&self) {
        self.inner.abort();
    }
}

impl Future for SearchHandle {
    type Output = Vec<SearchResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
            Ok(results) => results,
            Err(e) => vec![SearchResult::error(format!("Search failed: {}", e))],
        })
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedProvider(Vec<Value>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn fetch(&self, _query: &str, max_results: usize) -> Result<Vec<Value>, SearchError> {
            Ok(self.0.iter().take(max_results).cloned().collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        async fn fetch(&self, _query: &str, _max_results: usize) -> Result<Vec<Value>, SearchError> {
            Err(SearchError::Status(503))
        }
    }

    fn client(provider: impl SearchProvider + 'static) -> SearchClient {
        SearchClient::new(Arc::new(provider))
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(SearchClient::format_results(&[]), "No results found.");
    }

    #[test]
    fn test_format_single_result() {
        let results = vec![SearchResult::hit("A", "http://x", "s")];
        assert_eq!(
            SearchClient::format_results(&results),
            "1. A\n   Link: http://x\n   s\n"
        );
    }

    #[test]
    fn test_format_numbers_entries() {
        let results = vec![
            SearchResult::hit("A", "http://a", "first"),
            SearchResult::hit("B", "http://b", "second"),
        ];
        assert_eq!(
            SearchClient::format_results(&results),
            "1. A\n   Link: http://a\n   first\n\n2. B\n   Link: http://b\n   second\n"
        );
    }

    #[test]
    fn test_format_short_circuits_on_error() {
        let results = vec![
            SearchResult::hit("A", "http://a", "first"),
            SearchResult::error("boom"),
            SearchResult::hit("B", "http://b", "second"),
        ];
        assert_eq!(SearchClient::format_results(&results), "Error: boom");
        assert_eq!(
            SearchClient::format_results(&[SearchResult::error("boom")]),
            "Error: boom"
        );
    }

    #[tokio::test]
    async fn test_search_fills_placeholders() {
        let client = client(FixedProvider(vec![
            json!({"title": "Paris", "href": "https://en.wikipedia.org/wiki/Paris", "body": "Capital of France"}),
            json!({"link": "https://example.com"}),
        ]));

        let results = client.search("capital of france", 5).await;
        assert_eq!(
            results,
            vec![
                SearchResult::hit("Paris", "https://en.wikipedia.org/wiki/Paris", "Capital of France"),
                SearchResult::hit("No title", "https://example.com", "No snippet"),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_skips_malformed_records() {
        let client = client(FixedProvider(vec![
            json!("not an object"),
            json!({"title": 42}),
            json!({"title": "ok", "href": "http://ok", "body": "fine"}),
        ]));

        let results = client.search("q", 5).await;
        assert_eq!(results, vec![SearchResult::hit("ok", "http://ok", "fine")]);
    }

    #[tokio::test]
    async fn test_search_provider_failure_becomes_error_element() {
        let results = client(FailingProvider).search("q", 5).await;
        assert_eq!(results, vec![SearchResult::error("Search failed: HTTP 503")]);
        assert!(results[0].is_error());
    }

    #[tokio::test]
    async fn test_async_search_matches_search() {
        let client = client(FixedProvider(vec![
            json!({"title": "a", "href": "http://a", "body": "1"}),
            json!({"title": "b", "href": "http://b", "body": "2"}),
        ]));

        let direct = client.search("q", 1).await;
        let spawned = client.async_search("q", 1).await;
        assert_eq!(direct, spawned);
        assert_eq!(spawned.len(), 1);
    }

    #[test]
    fn test_result_serialization_shapes() {
        let hit = serde_json::to_value(SearchResult::hit("t", "l", "s")).unwrap();
        assert_eq!(hit, json!({"title": "t", "link": "l", "snippet": "s"}));

        let err = serde_json::to_value(SearchResult::error("boom")).unwrap();
        assert_eq!(err, json!({"error": "boom"}));
    }
}
