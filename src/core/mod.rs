//! 核心层：错误类型与管线阶段

pub mod error;
pub mod state;

pub use error::{AgentError, ErrorKind, ReplyError};
pub use state::PipelinePhase;
