//! DuckDuckGo 搜索 Provider（HTML 版，无需 API Key）
//!
//! GET html.duckduckgo.com/html/?q=...，按 `result__a` 锚点切分结果块，
//! 每块提取标题、链接（解开 /l/?uddg= 跳转）与摘要，输出与 Python 版 DDGS 一致的
//! `{title, href, body}` 原始记录。

use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read;
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::{json, Map, Value};

use crate::tools::search::{SearchError, SearchProvider};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// DuckDuckGo HTML 搜索
pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: String,
    title_re: Regex,
    href_re: Regex,
    snippet_re: Regex,
    tag_re: Regex,
}

impl DuckDuckGoProvider {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            title_re: compile(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#)?,
            href_re: compile(r#"href="([^"]*)""#)?,
            snippet_re: compile(r#"(?s)<(?:a|div|td)[^>]*class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)?,
            tag_re: compile(r"(?s)<[^>]*>")?,
        })
    }

    /// 解析结果页 HTML 为原始记录，最多 max_results 条
    pub fn parse_results(&self, html: &str, max_results: usize) -> Vec<Value> {
        let anchors: Vec<_> = self.title_re.captures_iter(html).collect();
        let mut records = Vec::new();

        for (i, caps) in anchors.iter().enumerate() {
            if records.len() >= max_results {
                break;
            }
            let (Some(whole), Some(attrs), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            // 当前结果块：本锚点到下一个锚点之间
            let block_end = anchors
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(html.len());
            let block = &html[whole.end()..block_end];

            let mut record = Map::new();
            let title = self.fragment_to_text(inner.as_str());
            if !title.is_empty() {
                record.insert("title".into(), json!(title));
            }
            if let Some(href) = self.href_re.captures(attrs.as_str()).and_then(|c| c.get(1)) {
                record.insert("href".into(), json!(unwrap_redirect(href.as_str())));
            }
            if let Some(snippet) = self.snippet_re.captures(block).and_then(|c| c.get(1)) {
                let body = self.fragment_to_text(snippet.as_str());
                if !body.is_empty() {
                    record.insert("body".into(), json!(body));
                }
            }
            records.push(Value::Object(record));
        }

        records
    }

    /// 去标签、解码实体、折叠空白
    fn fragment_to_text(&self, fragment: &str) -> String {
        let stripped = self.tag_re.replace_all(fragment, "");
        let decoded = match from_read(stripped.as_bytes(), 10_000) {
            Ok(text) => text,
            Err(_) => stripped.into_owned(),
        };
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn compile(pattern: &str) -> Result<Regex, SearchError> {
    Regex::new(pattern).map_err(|e| SearchError::Parse(e.to_string()))
}

/// DuckDuckGo 结果链接形如 `//duckduckgo.com/l/?uddg=<编码后的目标>&rut=...`，取出真实目标
fn unwrap_redirect(href: &str) -> String {
    let href = href.replace("&amp;", "&");
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.clone()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.path().starts_with("/l/") => url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        Ok(_) => absolute,
        Err(_) => href,
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Value>, SearchError> {
        tracing::info!(query = %query, "duckduckgo search");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SearchError::Status(resp.status().as_u16()));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("Read body: {}", e)))?;

        Ok(self.parse_results(&html, max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FParis&amp;rut=abc">Paris - <b>Wikipedia</b></a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Paris is the <b>capital</b> of France &amp; its largest city.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://example.com/france">France facts</a>
    </h2>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://example.org/third">Third</a>
    </h2>
    <a class="result__snippet" href="https://example.org/third">Third snippet</a>
  </div>
</div>
"#;

    fn provider() -> DuckDuckGoProvider {
        DuckDuckGoProvider::new("https://html.duckduckgo.com/html/", 5).unwrap()
    }

    #[test]
    fn test_parse_results_extracts_fields() {
        let records = provider().parse_results(SAMPLE, 5);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0]["title"], "Paris - Wikipedia");
        assert_eq!(records[0]["href"], "https://en.wikipedia.org/wiki/Paris");
        assert_eq!(
            records[0]["body"],
            "Paris is the capital of France & its largest city."
        );
    }

    #[test]
    fn test_missing_snippet_is_left_absent() {
        let records = provider().parse_results(SAMPLE, 5);
        assert_eq!(records[1]["href"], "https://example.com/france");
        assert!(records[1].get("body").is_none());
        assert_eq!(records[2]["body"], "Third snippet");
    }

    #[test]
    fn test_parse_respects_max_results() {
        assert_eq!(provider().parse_results(SAMPLE, 1).len(), 1);
        assert!(provider().parse_results("<html></html>", 5).is_empty());
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("//duckduckgo.com/l/?uddg=https%3A%2F%2Fdocs.rs%2F&amp;rut=1"),
            "https://docs.rs/"
        );
        assert_eq!(unwrap_redirect("https://docs.rs/tokio"), "https://docs.rs/tokio");
    }
}
