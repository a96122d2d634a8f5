//! LLM adapter abstraction (spec §4.1): a sync [`LlmCaller`] trait the
//! orchestration core calls directly, backed by async provider clients
//! wrapped through [`SyncWrapper`] — the same split as the teacher's
//! `llm/mod.rs`, generalized to the `Message`/`LlmCompletion` wire types.

use crate::tools::ToolSchema;
use crate::types::{LlmCompletion, Message};
use async_trait::async_trait;

mod anthropic;
mod mock;
mod openai;

pub use anthropic::AnthropicCaller;
pub use mock::MockLlmCaller;
pub use openai::OpenAiCaller;

/// The single interface between the orchestration core and any LLM
/// provider. Callers pass the exact tool schema list the LLM should be
/// allowed to use for this turn — the full registry's schemas for the
/// single-agent loop, or a role-restricted subset for a specialist.
///
/// # Contract
/// - `Send + Sync` (stored behind `Arc<dyn LlmCaller>`)
/// - Returns `Err` only for unrecoverable failures: network/auth failure,
///   or a response that cannot be parsed into an [`LlmCompletion`].
pub trait LlmCaller: Send + Sync {
    fn complete(&self, messages: &[Message], tools: &[ToolSchema], model: &str) -> Result<LlmCompletion, String>;
}

/// Async counterpart implemented by provider clients.
#[async_trait]
pub trait AsyncLlmCaller: Send + Sync {
    async fn complete_async(&self, messages: &[Message], tools: &[ToolSchema], model: &str) -> Result<LlmCompletion, String>;
}

/// Wraps an [`AsyncLlmCaller`] into a sync [`LlmCaller`] via
/// `block_in_place` + `Handle::block_on`, matching the teacher's
/// `SyncWrapper` — `block_in_place` first moves the calling thread out of
/// the async executor context, avoiding the "cannot start a runtime from
/// within a runtime" panic when invoked from inside `#[tokio::main]`.
pub struct SyncWrapper<T: AsyncLlmCaller>(pub T);

impl<T: AsyncLlmCaller> LlmCaller for SyncWrapper<T> {
    fn complete(&self, messages: &[Message], tools: &[ToolSchema], model: &str) -> Result<LlmCompletion, String> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.0.complete_async(messages, tools, model))
        })
    }
}
