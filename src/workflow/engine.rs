//! Workflow graph driver (spec §4.5) — generalizes the teacher's
//! `AgentEngine::run` (iterate, dispatch to the current node's handler,
//! look up the transition, advance) to the Supervisor/specialist/combiner
//! graph, with the Supervisor re-entry fix applied (§4.4/§4.5).

use crate::agent::SpecialistRole;
use crate::error::AgentError;
use crate::supervisor::Supervisor;
use crate::types::WorkflowState;
use crate::workflow::nodes::{build_transition_table, TransitionTable, WorkflowEvent, WorkflowNode};
use std::collections::HashMap;

/// Drives one [`Supervisor`] through the workflow graph to completion.
pub struct WorkflowEngine<'a> {
    supervisor: &'a Supervisor,
    transitions: TransitionTable,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(supervisor: &'a Supervisor) -> Self {
        Self { supervisor, transitions: build_transition_table() }
    }

    /// Runs the graph for `user_input`, bounded by `max_iterations`
    /// Supervisor re-entries (plus a `3x` safety cap on raw ticks, matching
    /// the teacher's `engine.rs` — a node handler misbehaving and never
    /// advancing the node would otherwise loop forever).
    pub fn run(&self, user_input: &str, max_iterations: usize) -> Result<WorkflowState, AgentError> {
        let mut state = WorkflowState::new(user_input, max_iterations);
        let mut node = WorkflowNode::Supervisor;
        let safety_cap = max_iterations.max(1) * 3;
        let mut ticks = 0usize;

        loop {
            ticks += 1;
            if ticks > safety_cap {
                return Err(AgentError::SafetyCapExceeded(ticks));
            }

            if node.is_terminal() {
                return Ok(state);
            }

            let event = match node {
                WorkflowNode::Supervisor => self.tick_supervisor(&mut state),
                WorkflowNode::Agent(role) => self.tick_agent(role, &mut state),
                WorkflowNode::Combiner => self.tick_combiner(&mut state),
                WorkflowNode::Finish => unreachable!("terminal node handled above"),
            };

            let next = self
                .transitions
                .get(&(node, event))
                .copied()
                .ok_or_else(|| AgentError::InvalidTransition { from: node.to_string(), event: event.to_string() })?;

            tracing::info!(from = %node, event = %event, to = %next, "workflow transition");
            node = next;
        }
    }

    /// Routes with the results accumulated so far, so a re-entrant call
    /// advances past the agent it already ran instead of repeating the
    /// same first-agent choice forever (the original's re-entry quirk,
    /// fixed per §4.4/§4.5).
    fn tick_supervisor(&self, state: &mut WorkflowState) -> WorkflowEvent {
        if state.iteration >= state.max_iterations {
            state.errors.push(format!("최대 반복 횟수({})에 도달했습니다.", state.max_iterations));
            state.iteration += 1;
            state.next_agent = "finish".to_string();
            return WorkflowEvent::RouteToCombiner;
        }

        let decision = self.supervisor.route_with_context(&state.user_input, Some(&state.agent_results));
        state.iteration += 1;
        state.current_agent = "supervisor".to_string();
        state.messages.push(format!("[Supervisor] {}", decision.reasoning));

        match decision.agents.iter().find_map(|name| SpecialistRole::from_name(name).filter(|role| !state.agent_results.contains_key(role.name()))) {
            Some(role) => {
                state.next_agent = role.name().to_string();
                WorkflowEvent::RouteToAgent(role)
            }
            None => {
                state.next_agent = "finish".to_string();
                WorkflowEvent::RouteToCombiner
            }
        }
    }

    fn tick_agent(&self, role: SpecialistRole, state: &mut WorkflowState) -> WorkflowEvent {
        let context: HashMap<String, String> = state
            .agent_results
            .iter()
            .map(|(name, result)| (name.clone(), result.result.clone().unwrap_or_else(|| result.error.clone().unwrap_or_default())))
            .collect();

        let agent = self.supervisor.agent(role.name()).expect("workflow graph only routes to registered specialists");
        let result = agent.run(&state.user_input, Some(&context), &mut state.scratch);

        state.current_agent = role.name().to_string();
        state.next_agent = "supervisor".to_string();
        state.agent_results.insert(role.name().to_string(), result);
        state.messages.push(format!("[{}] 실행 완료", role.name()));

        WorkflowEvent::AgentCompleted
    }

    fn tick_combiner(&self, state: &mut WorkflowState) -> WorkflowEvent {
        state.current_agent = "combiner".to_string();
        state.next_agent = "finish".to_string();
        state.final_response = self.supervisor.combine_results(&state.user_input, &state.agent_results);
        state.messages.push("[Combiner] 결과 통합 완료".to_string());
        WorkflowEvent::Combined
    }
}
