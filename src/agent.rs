//! Agent 编排器：单会话的消息处理管线
//!
//! process_message 对单条用户输入依次执行：记录用户消息 → 判断是否联网搜索 → 搜索（独立任务 + 超时）
//! → 组装 Prompt → 调用模型 → 记录回复 → 返回结构化结果。
//! 每次调用恰好追加两条消息（user 在前、assistant 在后），失败时把道歉文本作为 assistant 消息记录，
//! 并在回复的 `error` 字段中标注原因；任何错误都不会抛给调用方。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::time::timeout;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::{AgentError, PipelinePhase, ReplyError};
use crate::llm::{create_llm_from_config, LlmClient, LlmError};
use crate::memory::{ConversationMemory, Role};
use crate::tools::{DuckDuckGoProvider, SearchClient, SearchResult, DEFAULT_MAX_RESULTS};

/// 触发联网搜索的关键词（小写子串匹配，不做词干与否定处理）
pub const SEARCH_INDICATORS: &[&str] = &[
    "latest",
    "current",
    "news",
    "recent",
    "update",
    "how to",
    "what is",
    "where can",
    "when did",
    "who is",
    "tell me about",
    "find",
    "search",
    "look up",
    "weather",
    "price",
    "cost",
];

/// 使用了搜索结果时追加在回复末尾的来源说明
pub const SEARCH_ATTRIBUTION: &str = "(Response includes information from web search)";

const SEARCH_TOOL_NAME: &str = "web_search";

/// 单次处理的结构化结果
#[derive(Clone, Debug, Serialize)]
pub struct AgentReply {
    pub response: String,
    pub used_search: bool,
    pub search_results: Option<Vec<SearchResult>>,
    /// 刚记录的 assistant 消息的时间戳
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl AgentReply {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 编排参数：搜索开关、条数与超时
#[derive(Clone, Debug)]
pub struct AgentOptions {
    pub search_enabled: bool,
    pub max_results: usize,
    pub search_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            search_enabled: true,
            max_results: DEFAULT_MAX_RESULTS,
            search_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&AppConfig> for AgentOptions {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            search_enabled: cfg.search.enabled,
            max_results: cfg.search.max_results,
            search_timeout: Duration::from_secs(cfg.search.timeout_secs),
            request_timeout: Duration::from_secs(cfg.llm.timeouts.request),
        }
    }
}

/// 搜索步骤的结果
enum SearchOutcome {
    Skipped,
    Empty,
    Used {
        formatted: String,
        results: Vec<SearchResult>,
    },
    Failed(String),
}

impl SearchOutcome {
    /// Prompt 中的搜索段落
    fn prompt_section(&self) -> Option<String> {
        match self {
            SearchOutcome::Used { formatted, .. } => {
                Some(format!("\nBased on recent search results:\n{}", formatted))
            }
            SearchOutcome::Failed(reason) => {
                Some(format!("\nNote: Search attempted but failed: {}", reason))
            }
            SearchOutcome::Skipped | SearchOutcome::Empty => None,
        }
    }
}

/// 单个对话会话：由宿主（终端、Web 等）创建一次并独占持有
pub struct Agent {
    session_id: Uuid,
    memory: ConversationMemory,
    search: SearchClient,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    options: AgentOptions,
    phase: PipelinePhase,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, search: SearchClient, system_prompt: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            memory: ConversationMemory::new(),
            search,
            llm,
            system_prompt: system_prompt.into(),
            options: AgentOptions::default(),
            phase: PipelinePhase::Idle,
        }
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    /// 按配置创建：LLM 后端、DuckDuckGo 搜索、System Prompt 与超时
    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        if cfg.search.max_results == 0 {
            return Err(AgentError::ConfigError(
                "search.max_results must be at least 1".to_string(),
            ));
        }

        let provider = DuckDuckGoProvider::new(cfg.search.endpoint.clone(), cfg.search.timeout_secs)
            .map_err(|e| AgentError::ConfigError(format!("search client: {}", e)))?;
        let llm = create_llm_from_config(cfg);

        Ok(Self::new(llm, SearchClient::new(Arc::new(provider)), cfg.app.system_prompt())
            .with_options(AgentOptions::from(cfg)))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 最近一次处理到达的阶段
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// 关键词启发式：小写后包含任一关键词即搜索
    pub fn should_use_search(query: &str) -> bool {
        let query = query.to_lowercase();
        SEARCH_INDICATORS
            .iter()
            .any(|indicator| query.contains(indicator))
    }

    /// 组装 Prompt：System Prompt、对话历史、用户问题，以及可选的搜索结果
    pub fn build_prompt(&self, query: &str, search_results: Option<&str>) -> String {
        let section = search_results.map(|results| format!("\nSearch results:\n{}", results));
        self.assemble_prompt("\nConversation history:", query, section.as_deref())
    }

    fn assemble_prompt(&self, history_header: &str, query: &str, search_section: Option<&str>) -> String {
        let mut parts = vec![
            self.system_prompt.clone(),
            history_header.to_string(),
            self.memory.get_formatted_history(),
            format!("\nUser query: {}", query),
        ];
        if let Some(section) = search_section {
            parts.push(section.to_string());
        }
        parts.join("\n")
    }

    /// 处理一条用户消息；总是返回结构完整的回复
    pub async fn process_message(&mut self, message: &str) -> AgentReply {
        let span = tracing::info_span!("process_message", session = %self.session_id);
        async move {
            self.enter(PipelinePhase::Received);
            self.memory.add_message(Role::User, message, None);

            match self.run_pipeline(message).await {
                Ok(reply) => reply,
                Err(e) => self.record_failure(e),
            }
        }
        .instrument(span)
        .await
    }

    /// 清空会话记忆（对应「新对话」）
    pub fn clear_memory(&mut self) {
        tracing::info!(session = %self.session_id, "conversation cleared");
        self.memory.clear();
        self.phase = PipelinePhase::Idle;
    }

    fn enter(&mut self, phase: PipelinePhase) {
        tracing::debug!(?phase, "pipeline phase");
        self.phase = phase;
    }

    async fn run_pipeline(&mut self, message: &str) -> Result<AgentReply, AgentError> {
        self.enter(PipelinePhase::SearchDecision);
        let outcome = if self.options.search_enabled && Self::should_use_search(message) {
            self.enter(PipelinePhase::Searching);
            self.run_search(message).await
        } else {
            tracing::debug!("search not needed");
            SearchOutcome::Skipped
        };

        self.enter(PipelinePhase::Prompting);
        let section = outcome.prompt_section();
        let prompt = self.assemble_prompt("\nPrevious conversation:", message, section.as_deref());

        self.enter(PipelinePhase::ModelCall);
        let secs = self.options.request_timeout.as_secs();
        let completion = timeout(self.options.request_timeout, self.llm.complete(&prompt))
            .await
            .map_err(|_| LlmError::Timeout(secs))??;

        let (used_search, search_results) = match outcome {
            SearchOutcome::Used { results, .. } => (true, Some(results)),
            _ => (false, None),
        };

        let mut response = completion.trim().to_string();
        if used_search {
            response.push_str("\n\n");
            response.push_str(SEARCH_ATTRIBUTION);
        }

        self.enter(PipelinePhase::Recorded);
        let timestamp = self
            .memory
            .add_message(Role::Assistant, response.clone(), None)
            .timestamp;

        self.enter(PipelinePhase::Returned);
        tracing::info!(used_search, "message processed");
        Ok(AgentReply {
            response,
            used_search,
            search_results,
            timestamp,
            error: None,
        })
    }

    /// 搜索在独立任务中执行，超时即放弃；结果写入工具调用日志
    async fn run_search(&mut self, message: &str) -> SearchOutcome {
        let max_results = self.options.max_results;
        let handle = self.search.async_search(message, max_results);

        let outcome = match timeout(self.options.search_timeout, handle).await {
            Err(_) => SearchOutcome::Failed(format!(
                "timed out after {}s",
                self.options.search_timeout.as_secs()
            )),
            Ok(results) if results.is_empty() => SearchOutcome::Empty,
            Ok(results) => match results.iter().find_map(|r| match r {
                SearchResult::Error { error } => Some(error.clone()),
                SearchResult::Hit { .. } => None,
            }) {
                Some(error) => {
                    let reason = error.strip_prefix("Search failed: ").unwrap_or(error.as_str());
                    SearchOutcome::Failed(reason.to_string())
                }
                None => SearchOutcome::Used {
                    formatted: SearchClient::format_results(&results),
                    results,
                },
            },
        };

        let output = match &outcome {
            SearchOutcome::Used { results, .. } => json!({ "results": results }),
            SearchOutcome::Failed(reason) => {
                tracing::warn!(reason = %reason, "search attempted but failed");
                json!({ "error": reason })
            }
            _ => json!({ "results": [] }),
        };
        self.memory.add_tool_use(
            SEARCH_TOOL_NAME,
            to_map(json!({ "query": message, "max_results": max_results })),
            to_map(output),
        );

        outcome
    }

    /// 失败策略：道歉文本按普通回复记入历史，并在回复中标注错误
    fn record_failure(&mut self, err: AgentError) -> AgentReply {
        tracing::warn!(error = %err, "message processing failed");
        let response = format!("I apologize, but I encountered an error: {}", err);
        let timestamp = self
            .memory
            .add_message(Role::Assistant, response.clone(), None)
            .timestamp;
        self.enter(PipelinePhase::ErrorRecorded);

        AgentReply {
            response,
            used_search: false,
            search_results: None,
            timestamp,
            error: Some(ReplyError::from(&err)),
        }
    }
}

fn to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
