//! 工具：联网搜索（Provider 抽象 + DuckDuckGo 实现 + 结果统一与格式化）

pub mod duckduckgo;
pub mod search;

pub use duckduckgo::DuckDuckGoProvider;
pub use search::{
    SearchClient, SearchError, SearchHandle, SearchProvider, SearchResult, DEFAULT_MAX_RESULTS,
};
