//! kira-core – collaborator clients and the chat-reply pipeline shared by the
//! kira binaries.
//!
//! Every external model or engine is reached through a trait in
//! [`services`], so the HTTP layer only depends on the contracts and tests can
//! substitute in-process fakes.

pub mod exchange_log;
pub mod pipeline;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use exchange_log::{ChatExchange, ExchangeLog, ExchangeOutput};
pub use pipeline::{ChatReplyPipeline, PipelineError};
pub use services::ServiceError;
pub use types::{Category, KiraReply, StructuredReply, Transcription};
