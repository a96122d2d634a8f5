use thiserror::Error;

/// Programmer-error class only — see module docs in `lib.rs` for the
/// runtime/recoverable-error class, which is represented as data
/// (`AgentResult`, observation strings, fallback `RoutingDecision`)
/// rather than propagated through `Result`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid workflow transition: {from} + {event} not in transition table")]
    InvalidTransition { from: String, event: String },

    #[error("safety cap exceeded after {0} iterations")]
    SafetyCapExceeded(usize),

    #[error("missing required tool '{tool}' for role '{role}'")]
    MissingRequiredTool { role: &'static str, tool: &'static str },
}
