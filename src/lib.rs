//! ALM conversational analytics agent orchestration core.
//!
//! Two orchestration strategies over the same eleven ALM tools:
//! - [`react`]: a single bounded ReAct loop.
//! - [`agent`] + [`supervisor`] + [`workflow`]: a Supervisor routing to six
//!   domain specialists, either driven straight through (`Supervisor::run`)
//!   or via the [`workflow`] state machine.
//!
//! [`benchmark`] compares both strategies over a shared question set.
//!
//! # Error handling
//! Two classes of error exist in this crate, deliberately kept apart:
//! - **Runtime-recoverable** (a tool failing, an LLM call failing, a
//!   router producing garbage, an iteration cap being hit) is always
//!   represented as *data* — an "오류"-prefixed observation string, an
//!   `AgentResult{success: false}`, a fallback `RoutingDecision`, or an
//!   entry in `WorkflowState.errors` — and never propagated through
//!   `Result` out of a loop or workflow run.
//! - **Programmer error** (a missing required tool for a specialist role,
//!   an illegal workflow transition, a safety cap tripped by a handler
//!   that never advances) is represented by [`error::AgentError`] and
//!   surfaces through `Result`/panics, since no caller should be able to
//!   trigger it through normal input.

pub mod agent;
pub mod alm_tools;
pub mod benchmark;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod react;
pub mod supervisor;
pub mod tools;
pub mod types;
pub mod workflow;

// Convenience re-exports at crate root
pub use agent::{BaseAgent, SpecialistRole};
pub use error::AgentError;
pub use llm::{AsyncLlmCaller, LlmCaller, SyncWrapper};
pub use react::ReactAgent;
pub use supervisor::Supervisor;
pub use tools::{Tool, ToolFn, ToolRegistry, ToolSchema};
pub use types::{AgentResult, LlmCompletion, LoopConfig, Message, RoutingDecision, WorkflowState};
pub use workflow::{WorkflowEngine, WorkflowEvent, WorkflowNode};
