//! Specialist agents (spec §4.3): a shared ReAct micro-loop bounded to 5
//! iterations, parameterized by role, tool subset and prompt — grounded in
//! `multi_agent/base.py`'s `BaseAgent`.

use crate::llm::LlmCaller;
use crate::prompts;
use crate::tools::{Scratch, ToolRegistry};
use crate::types::{AgentResult, LoopConfig, Message, ToolCall};
use std::collections::HashMap;
use std::sync::Arc;

/// One of the six domain specialists the Supervisor can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SpecialistRole {
    Search,
    Market,
    Analysis,
    Position,
    Report,
    Export,
}

impl SpecialistRole {
    pub const ALL: [SpecialistRole; 6] =
        [SpecialistRole::Search, SpecialistRole::Market, SpecialistRole::Analysis, SpecialistRole::Position, SpecialistRole::Report, SpecialistRole::Export];

    /// The name used in routing decisions and benchmark categories.
    pub fn name(self) -> &'static str {
        match self {
            SpecialistRole::Search => "search_agent",
            SpecialistRole::Market => "market_agent",
            SpecialistRole::Analysis => "analysis_agent",
            SpecialistRole::Position => "position_agent",
            SpecialistRole::Report => "report_agent",
            SpecialistRole::Export => "export_agent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Tool names this specialist is allowed to call — the registry holds
    /// all eleven tools, but each role is bound only to its own subset.
    pub fn required_tools(self) -> &'static [&'static str] {
        match self {
            SpecialistRole::Search => &["search_alm_contracts"],
            SpecialistRole::Market => &["get_exchange_rate", "get_interest_rate"],
            SpecialistRole::Analysis => &["analyze_liquidity_gap", "get_aggregate_stats", "compare_scenarios", "analyze_trends"],
            SpecialistRole::Position => &["analyze_new_position_growth", "analyze_expired_position_decrease"],
            SpecialistRole::Report => &["generate_comprehensive_report"],
            SpecialistRole::Export => &["export_report"],
        }
    }

    pub fn prompt(self) -> &'static str {
        prompts::role_prompt(self)
    }
}

/// A bounded ReAct micro-loop for one specialist role.
pub struct BaseAgent {
    role: SpecialistRole,
    llm: Arc<dyn LlmCaller>,
    tools: Arc<ToolRegistry>,
    model: String,
    verbose: bool,
    config: LoopConfig,
}

impl BaseAgent {
    /// Binds a specialist to a tool registry. Panics if the registry is
    /// missing any of the role's required tools — a configuration error
    /// (spec §7) that should never survive past construction.
    pub fn new(role: SpecialistRole, llm: Arc<dyn LlmCaller>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        for tool in role.required_tools() {
            assert!(tools.has(tool), "{}", crate::error::AgentError::MissingRequiredTool { role: role.name(), tool });
        }
        Self { role, llm, tools, model: model.into(), verbose: false, config: LoopConfig::specialist() }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn role(&self) -> SpecialistRole {
        self.role
    }

    /// Executes `task`, optionally enriched with `context` (prior agent
    /// results rendered as `key: value` lines), returning a result that is
    /// never itself an error — failures are reported as `AgentResult::err`.
    ///
    /// `scratch` is the caller's per-turn tool workspace (see
    /// [`crate::tools::Scratch`]) — the same one must be threaded through
    /// every specialist run in one turn so e.g. `report_agent`'s
    /// `generate_comprehensive_report` and a later `export_agent`'s
    /// `export_report` can hand data off within that turn.
    pub fn run(&self, task: &str, context: Option<&HashMap<String, String>>, scratch: &mut Scratch) -> AgentResult {
        if self.verbose {
            tracing::info!(agent = self.role.name(), task = %task, "specialist run start");
        }

        let mut messages = vec![Message::system(self.role.prompt()), Message::user(task.to_string())];
        if let Some(context) = context {
            if !context.is_empty() {
                messages.push(Message::user(format!("\n\n컨텍스트 정보:\n{}", Self::format_context(context))));
            }
        }

        let schemas = self.tools.schemas_for(self.role.required_tools());

        for iteration in 1..=self.config.max_iterations {
            let completion = match self.llm.complete(&messages, &schemas, &self.model) {
                Ok(c) => c,
                Err(err) => return AgentResult::err(err),
            };

            if completion.tool_calls.is_empty() {
                return AgentResult::ok(completion.content);
            }

            let tool_call: &ToolCall = &completion.tool_calls[0];
            if !self.role.required_tools().contains(&tool_call.name.as_str()) {
                return AgentResult::err(format!(
                    "오류: '{}' 도구를 찾을 수 없습니다. 사용 가능한 도구: {:?}",
                    tool_call.name,
                    self.role.required_tools()
                ));
            }

            let observation = self.tools.invoke(&tool_call.name, &tool_call.args, scratch);
            if self.verbose {
                tracing::debug!(agent = self.role.name(), iteration, tool = %tool_call.name, "specialist tool call");
            }

            messages.push(Message::assistant(completion.content.clone()));
            messages.push(Message::user(format!("도구 실행 결과:\n{observation}\n\n위 결과를 바탕으로 다음 단계를 결정하세요.")));
        }

        AgentResult::err(format!("최대 반복 횟수({})에 도달했습니다.", self.config.max_iterations))
    }

    fn format_context(context: &HashMap<String, String>) -> String {
        let mut keys: Vec<&String> = context.keys().collect();
        keys.sort();
        keys.into_iter().map(|k| format!("- {k}: {}", context[k])).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alm_tools;
    use crate::llm::MockLlmCaller;
    use crate::tools::ToolRegistry;
    use crate::types::LlmCompletion;

    fn tools() -> Arc<ToolRegistry> {
        let mut r = ToolRegistry::new();
        alm_tools::register_all(&mut r);
        Arc::new(r)
    }

    #[test]
    fn returns_ok_when_llm_gives_a_final_answer_immediately() {
        let mock = MockLlmCaller::new(vec![LlmCompletion { content: "USD 계약 15건 발견".to_string(), tool_calls: vec![] }]);
        let agent = BaseAgent::new(SpecialistRole::Search, Arc::new(mock), tools(), "gpt-4");
        let result = agent.run("USD 계약 찾아줘", None, &mut Scratch::new());
        assert!(result.success);
        assert_eq!(result.result.as_deref(), Some("USD 계약 15건 발견"));
    }

    #[test]
    fn rejects_a_tool_outside_its_role() {
        let mock = MockLlmCaller::new(vec![LlmCompletion {
            content: String::new(),
            tool_calls: vec![ToolCall { name: "export_report".to_string(), args: serde_json::json!({}) }],
        }]);
        let agent = BaseAgent::new(SpecialistRole::Search, Arc::new(mock), tools(), "gpt-4");
        let result = agent.run("계약 검색해줘", None, &mut Scratch::new());
        assert!(!result.success);
    }

    #[test]
    #[should_panic(expected = "missing required tool")]
    fn panics_at_construction_if_the_registry_lacks_a_required_tool() {
        let empty_registry = Arc::new(ToolRegistry::new());
        let mock = MockLlmCaller::new(vec![]);
        BaseAgent::new(SpecialistRole::Search, Arc::new(mock), empty_registry, "gpt-4");
    }
}
