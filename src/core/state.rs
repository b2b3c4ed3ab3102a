//! 单次消息处理的阶段
//!
//! Received → SearchDecision → [Searching] → Prompting → ModelCall → Recorded → Returned；
//! 任一阶段出错都转入 ErrorRecorded（仍会把错误文本记为 assistant 消息）。

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum PipelinePhase {
    #[default]
    Idle,
    Received,
    SearchDecision,
    Searching,
    Prompting,
    ModelCall,
    Recorded,
    Returned,
    ErrorRecorded,
}

impl PipelinePhase {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelinePhase::Returned | PipelinePhase::ErrorRecorded)
    }
}
