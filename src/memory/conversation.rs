//! 短期记忆：对话历史、上下文键值、工具调用日志
//!
//! 单会话、仅进程内存：不做持久化、不做剪枝。写入由 Agent 独占（&mut），
//! 保证消息顺序即对话顺序。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 消息角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// 单条消息（追加后不可变）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, metadata: Option<Map<String, Value>>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: metadata.unwrap_or_default(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, None)
    }
}

/// 工具调用记录：只写审计日志，编排器不回读
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub tool_name: String,
    pub input: Map<String, Value>,
    pub output: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// 会话记忆：消息序列 + 上下文键值（后写覆盖） + 工具调用日志
#[derive(Clone, Debug, Default)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    context: HashMap<String, Value>,
    tool_history: Vec<ToolInvocationRecord>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条消息，时间戳取当前时刻；返回刚追加的消息
    pub fn add_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> &Message {
        self.messages.push(Message::new(role, content, metadata));
        &self.messages[self.messages.len() - 1]
    }

    pub fn add_tool_use(
        &mut self,
        tool_name: impl Into<String>,
        input: Map<String, Value>,
        output: Map<String, Value>,
    ) {
        self.tool_history.push(ToolInvocationRecord {
            tool_name: tool_name.into(),
            input,
            output,
            timestamp: Utc::now(),
        });
    }

    /// 最近 `limit` 条消息（保持原顺序）；不足时返回全部，`limit == 0` 返回空
    pub fn get_recent_messages(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    /// 返回全部上下文；`query` 暂不参与过滤（相关性排序尚未实现）
    pub fn get_relevant_context(&self, _query: Option<&str>) -> &HashMap<String, Value> {
        &self.context
    }

    pub fn update_context(&mut self, key: impl Into<String>, value: Value) {
        self.context.insert(key.into(), value);
    }

    /// 清空消息、上下文与工具日志（对应「新对话」）
    pub fn clear(&mut self) {
        self.messages.clear();
        self.context.clear();
        self.tool_history.clear();
    }

    /// 供 LLM 上下文使用的历史文本：每条一行 `ROLE: content`
    pub fn get_formatted_history(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn tool_history(&self) -> &[ToolInvocationRecord] {
        &self.tool_history
    }

    pub fn context_len(&self) -> usize {
        self.context.len()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formatted_history() {
        let mut memory = ConversationMemory::new();
        assert_eq!(memory.get_formatted_history(), "");

        memory.add_message(Role::User, "hi", None);
        memory.add_message(Role::Assistant, "hello", None);
        assert_eq!(memory.get_formatted_history(), "USER: hi\nASSISTANT: hello");
    }

    #[test]
    fn test_recent_messages_keeps_order() {
        let mut memory = ConversationMemory::new();
        for i in 0..5 {
            memory.add_message(Role::User, format!("m{i}"), None);
        }

        let recent: Vec<&str> = memory
            .get_recent_messages(2)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(recent, vec!["m3", "m4"]);
        assert_eq!(memory.get_recent_messages(10).len(), 5);
        assert!(memory.get_recent_messages(0).is_empty());
    }

    #[test]
    fn test_metadata_defaults_to_empty() {
        let mut memory = ConversationMemory::new();
        let msg = memory.add_message(Role::User, "hi", None);
        assert!(msg.metadata.is_empty());

        let mut meta = Map::new();
        meta.insert("source".into(), json!("cli"));
        let msg = memory.add_message(Role::User, "again", Some(meta));
        assert_eq!(msg.metadata.get("source"), Some(&json!("cli")));
    }

    #[test]
    fn test_context_upsert_and_idempotent_reads() {
        let mut memory = ConversationMemory::new();
        memory.update_context("city", json!("Paris"));
        memory.update_context("city", json!("Lyon"));
        memory.update_context("units", json!("metric"));

        let first = memory.get_relevant_context(Some("weather")).clone();
        let second = memory.get_relevant_context(None).clone();
        assert_eq!(first, second);
        assert_eq!(first.get("city"), Some(&json!("Lyon")));
        assert_eq!(memory.context_len(), 2);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut memory = ConversationMemory::new();
        memory.add_message(Role::User, "hi", None);
        memory.update_context("k", json!(1));
        memory.add_tool_use("web_search", Map::new(), Map::new());

        memory.clear();
        assert_eq!(memory.len(), 0);
        assert_eq!(memory.context_len(), 0);
        assert!(memory.tool_history().is_empty());
        assert_eq!(memory.get_formatted_history(), "");
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let msg = Message::assistant("ok");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], json!("assistant"));
        assert!(value["timestamp"].as_str().is_some());
    }
}
