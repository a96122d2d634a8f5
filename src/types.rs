//! Shared data model (spec §3): messages, tool calls, agent results, routing
//! decisions and the multi-agent workflow's shared state record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tagged role of a [`Message`] in a conversation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn in a conversation buffer.
///
/// Created during a loop iteration, appended to a local buffer, and
/// discarded at the end of the top-level run — except for an explicit
/// `chat_history` the caller retains across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_calls: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_calls: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_calls: None }
    }
}

/// A tool invocation requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// Flat record of primitives (spec Design Notes "Tool input shapes") —
    /// nested/complex input travels as a JSON string field instead, e.g.
    /// `filters_json`.
    pub args: serde_json::Value,
}

/// What a bound LLM adapter returns for one turn (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmCompletion {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// One completed tool invocation recorded by a ReAct loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub iteration: usize,
    pub tool: String,
    pub success: bool,
}

/// The outcome of one agent invocation (single- or multi-agent).
///
/// Invariant: `success` requires `result` non-null and `error` null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl AgentResult {
    pub fn ok(result: impl Into<String>) -> Self {
        Self { success: true, result: Some(result.into()), error: None }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, result: None, error: Some(error.into()) }
    }
}

/// The Supervisor's routing output (spec §4.4).
///
/// Invariant: every name in `agents` refers to a registered specialist.
/// A router that cannot be parsed, or that names an unregistered agent,
/// produces the fallback decision — `route()` never panics or returns
/// `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub agents: Vec<String>,
    pub parallel: bool,
    pub reasoning: String,
}

impl RoutingDecision {
    /// The safe default when the router's LLM output can't be trusted:
    /// a single-agent plan targeting the default search agent.
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            agents: vec!["search_agent".to_string()],
            parallel: false,
            reasoning: reasoning.into(),
        }
    }
}

/// Planning/execution bounds shared by the ReAct loop and `BaseAgent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoopConfig {
    pub max_iterations: usize,
}

impl LoopConfig {
    /// Default ceiling for the single-agent ReAct loop (spec §4.2).
    pub fn single_agent() -> Self {
        Self { max_iterations: 10 }
    }

    /// Default ceiling for a `BaseAgent` specialist micro-loop (spec §4.3).
    pub fn specialist() -> Self {
        Self { max_iterations: 5 }
    }
}

/// The multi-agent workflow's shared, append-oriented record (spec §3).
///
/// `messages` and `errors` are append-only; `agent_results` only grows.
/// [`crate::workflow::WorkflowEngine`]'s node handlers (`tick_supervisor`,
/// `tick_agent`, `tick_combiner`) take `&mut WorkflowState` and mutate it
/// directly — `iteration`/`next_agent`/`current_agent` are overwritten each
/// tick, while `messages`, `errors` and `agent_results` are only ever
/// pushed/inserted into, never cleared or shrunk (Design Notes
/// "Append-only list semantics").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub user_input: String,
    pub current_agent: String,
    pub next_agent: String,
    pub agent_results: HashMap<String, AgentResult>,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    pub iteration: usize,
    pub max_iterations: usize,
    pub final_response: String,
    /// Per-turn workspace replacing the original's module-level "last
    /// report" global (Design Notes "Global mutable state").
    pub scratch: HashMap<String, serde_json::Value>,
}

impl WorkflowState {
    pub fn new(user_input: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            user_input: user_input.into(),
            current_agent: "supervisor".to_string(),
            next_agent: String::new(),
            agent_results: HashMap::new(),
            messages: Vec::new(),
            errors: Vec::new(),
            iteration: 0,
            max_iterations,
            final_response: String::new(),
            scratch: HashMap::new(),
        }
    }
}
