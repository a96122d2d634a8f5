//! Node and event vocabulary for the multi-agent workflow graph, and its
//! static transition table — generalized from the teacher's `State`/
//! `Event`/`build_transition_table` trio to the six specialist roles.

use crate::agent::SpecialistRole;
use std::collections::HashMap;

/// A node in the multi-agent workflow graph.
///
/// Mirrors `multi_agent/workflow.py`'s `StateGraph` nodes: `supervisor`,
/// one node per specialist, `combiner`, and a terminal `finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WorkflowNode {
    Supervisor,
    Agent(SpecialistRole),
    Combiner,
    Finish,
}

impl std::fmt::Display for WorkflowNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowNode::Supervisor => write!(f, "supervisor"),
            WorkflowNode::Agent(role) => write!(f, "{}", role.name()),
            WorkflowNode::Combiner => write!(f, "combiner"),
            WorkflowNode::Finish => write!(f, "finish"),
        }
    }
}

impl WorkflowNode {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowNode::Finish)
    }
}

/// An outcome produced by a node handler, consumed by the transition table
/// to pick the next node. Mirrors the teacher's `Event` enum, restricted
/// to the routable destinations this graph actually has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WorkflowEvent {
    /// Supervisor chose a specialist to run next.
    RouteToAgent(SpecialistRole),
    /// Supervisor has nothing left to run (empty plan, or the iteration
    /// cap was just hit) — proceed straight to combining.
    RouteToCombiner,
    /// A specialist node finished; control always returns to Supervisor
    /// so it can decide the next step (`multi_agent/workflow.py`'s
    /// `agent_node` always sets `next_agent = SUPERVISOR`).
    AgentCompleted,
    /// Combiner produced the final response.
    Combined,
}

impl std::fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type TransitionTable = HashMap<(WorkflowNode, WorkflowEvent), WorkflowNode>;

/// Builds the complete transition table for the multi-agent graph.
///
/// Any `(node, event)` pair not present here is illegal and causes
/// [`crate::workflow::engine::WorkflowEngine::run`] to return
/// `AgentError::InvalidTransition`.
pub fn build_transition_table() -> TransitionTable {
    let mut t = HashMap::new();

    for role in SpecialistRole::ALL {
        t.insert((WorkflowNode::Supervisor, WorkflowEvent::RouteToAgent(role)), WorkflowNode::Agent(role));
        t.insert((WorkflowNode::Agent(role), WorkflowEvent::AgentCompleted), WorkflowNode::Supervisor);
    }

    t.insert((WorkflowNode::Supervisor, WorkflowEvent::RouteToCombiner), WorkflowNode::Combiner);
    t.insert((WorkflowNode::Combiner, WorkflowEvent::Combined), WorkflowNode::Finish);

    t
}
