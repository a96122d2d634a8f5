//! Supervisor (spec §4.4): routes a user question to one or more
//! specialists, runs them in sequence, and combines their results into one
//! final answer.
//!
//! Grounded in `multi_agent/supervisor.py`'s `SupervisorAgent` — the JSON
//! extraction fallback chain (fenced ```json block, then any fenced block,
//! then the raw text) and the "route failure falls back to a single
//! search_agent plan" behavior are both reproduced verbatim.

use crate::agent::{BaseAgent, SpecialistRole};
use crate::llm::LlmCaller;
use crate::prompts;
use crate::tools::Scratch;
use crate::types::{AgentResult, Message, RoutingDecision};
use std::collections::HashMap;
use std::sync::Arc;

/// Central coordinator holding one [`BaseAgent`] per specialist role.
pub struct Supervisor {
    llm: Arc<dyn LlmCaller>,
    agents: HashMap<String, BaseAgent>,
    model: String,
    verbose: bool,
}

impl Supervisor {
    /// Builds a Supervisor over exactly the six required specialists.
    ///
    /// Panics if `agents` is missing any of them — mirroring the
    /// constructor-time `ValueError` the original raises for a missing
    /// agent, since this is a programmer error, not a runtime one.
    pub fn new(llm: Arc<dyn LlmCaller>, agents: HashMap<String, BaseAgent>, model: impl Into<String>) -> Self {
        let missing: Vec<&str> = SpecialistRole::ALL.iter().map(|r| r.name()).filter(|name| !agents.contains_key(*name)).collect();
        assert!(missing.is_empty(), "Supervisor: missing required agents: {missing:?}");
        Self { llm, agents, model: model.into(), verbose: false }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Looks up one specialist by its routing name — used by the workflow
    /// state machine, which drives agents one node at a time instead of
    /// through `execute_agents`'s sequential loop.
    pub(crate) fn agent(&self, name: &str) -> Option<&BaseAgent> {
        self.agents.get(name)
    }

    /// Decides which specialists to run for `user_input`, with no prior
    /// agent context.
    pub fn route(&self, user_input: &str) -> RoutingDecision {
        self.route_with_context(user_input, None)
    }

    /// Decides which specialists to run, optionally informed by results
    /// already produced earlier in the same turn — used by the workflow
    /// state machine so a re-entrant router call can advance past the
    /// agent it just ran instead of repeating the same plan.
    pub fn route_with_context(&self, user_input: &str, prior_results: Option<&HashMap<String, AgentResult>>) -> RoutingDecision {
        if self.verbose {
            tracing::info!(user_input = %user_input, "supervisor routing start");
        }

        let mut user_turn = format!("사용자 질문: {user_input}");
        if let Some(prior) = prior_results {
            if !prior.is_empty() {
                let mut names: Vec<&String> = prior.keys().collect();
                names.sort();
                let rendered: Vec<String> = names
                    .into_iter()
                    .map(|name| {
                        let result = &prior[name];
                        match &result.result {
                            Some(text) => format!("- {name}: {text}"),
                            None => format!("- {name}: (실패 - {})", result.error.as_deref().unwrap_or("알 수 없는 오류")),
                        }
                    })
                    .collect();
                user_turn.push_str(&format!("\n\n이미 실행된 에이전트 결과:\n{}", rendered.join("\n")));
            }
        }

        let messages = vec![Message::system(prompts::SUPERVISOR_PROMPT), Message::user(user_turn)];

        let response_text = match self.llm.complete(&messages, &[], &self.model) {
            Ok(completion) => completion.content,
            Err(err) => return RoutingDecision::fallback(format!("라우팅 오류로 기본 에이전트 사용: {err}")),
        };

        match Self::parse_routing_decision(&response_text) {
            Ok(decision) => self.validate_and_rewrite(decision),
            Err(err) => {
                if self.verbose {
                    tracing::warn!(error = %err, response = %response_text, "routing decision parse failed");
                }
                RoutingDecision::fallback(format!("JSON 파싱 오류로 기본 에이전트 사용: {err}"))
            }
        }
    }

    /// Extracts the JSON routing object from the LLM's raw text, trying a
    /// fenced ```json block, then any fenced block, then the raw text.
    fn parse_routing_decision(response_text: &str) -> Result<RoutingDecision, String> {
        let candidate = if let Some(rest) = response_text.split("```json").nth(1) {
            rest.split("```").next().unwrap_or(rest).trim()
        } else if response_text.contains("```") {
            response_text.split("```").nth(1).unwrap_or(response_text).trim()
        } else {
            response_text.trim()
        };

        serde_json::from_str(candidate).map_err(|e| e.to_string())
    }

    /// Validates agent names against the known roles and rewrites the plan
    /// so `export_agent` is always preceded by `report_agent` (Testable
    /// Property 6): a conforming Supervisor enforces this even if the
    /// router's own prompt-level instruction is ignored.
    fn validate_and_rewrite(&self, decision: RoutingDecision) -> RoutingDecision {
        let invalid: Vec<&String> = decision.agents.iter().filter(|name| !self.agents.contains_key(name.as_str())).collect();
        if !invalid.is_empty() {
            return RoutingDecision::fallback(format!("존재하지 않는 에이전트: {invalid:?}"));
        }

        let mut agents = Vec::with_capacity(decision.agents.len() + 1);
        for name in decision.agents {
            if name == "export_agent" && agents.last().map(String::as_str) != Some("report_agent") {
                agents.push("report_agent".to_string());
            }
            agents.push(name);
        }

        RoutingDecision { agents, parallel: decision.parallel, reasoning: decision.reasoning }
    }

    /// Runs every agent in `routing_decision.agents` in sequence, passing
    /// each the results accumulated so far as context (spec §4.4: the
    /// `parallel` flag is carried through as data but never changes
    /// execution to be concurrent — see spec §5).
    pub fn execute_agents(&self, user_input: &str, routing_decision: &RoutingDecision) -> HashMap<String, AgentResult> {
        let mut results: HashMap<String, AgentResult> = HashMap::new();
        let mut scratch = Scratch::new();

        if self.verbose {
            tracing::info!(agents = ?routing_decision.agents, parallel = routing_decision.parallel, "supervisor executing agents");
        }

        for agent_name in &routing_decision.agents {
            let Some(agent) = self.agents.get(agent_name) else {
                results.insert(agent_name.clone(), AgentResult::err(format!("오류: '{agent_name}' 에이전트를 찾을 수 없습니다.")));
                continue;
            };

            let context: HashMap<String, String> = results
                .iter()
                .map(|(name, result)| (name.clone(), result.result.clone().unwrap_or_else(|| result.error.clone().unwrap_or_default())))
                .collect();

            let result = agent.run(user_input, Some(&context), &mut scratch);
            if self.verbose {
                match &result.result {
                    Some(_) => tracing::info!(agent = %agent_name, "specialist succeeded"),
                    None => tracing::warn!(agent = %agent_name, error = ?result.error, "specialist failed"),
                }
            }
            results.insert(agent_name.clone(), result);
        }

        results
    }

    /// Integrates several specialist results into one final answer: a
    /// single successful result is returned as-is, several are combined by
    /// the LLM, and a total failure surfaces every error.
    pub fn combine_results(&self, user_input: &str, agent_results: &HashMap<String, AgentResult>) -> String {
        let mut names: Vec<&String> = agent_results.keys().collect();
        names.sort();

        let successful: Vec<(&String, &String)> =
            names.iter().filter_map(|name| agent_results[*name].result.as_ref().map(|result| (*name, result))).collect();

        if successful.is_empty() {
            let error_summary = names
                .iter()
                .map(|name| format!("- {name}: {}", agent_results[*name].error.as_deref().unwrap_or("알 수 없는 오류")))
                .collect::<Vec<_>>()
                .join("\n");
            return format!("죄송합니다. 요청을 처리하는 중 오류가 발생했습니다:\n\n{error_summary}");
        }

        if successful.len() == 1 {
            return successful[0].1.clone();
        }

        let results_text = successful.iter().map(|(name, result)| format!("## {name} 결과:\n{result}")).collect::<Vec<_>>().join("\n\n");

        let messages = vec![
            Message::system(prompts::COMBINER_PROMPT),
            Message::user(format!("사용자 질문: {user_input}\n\n다음 에이전트들의 실행 결과를 통합하여 최종 응답을 작성하세요:\n\n{results_text}")),
        ];

        match self.llm.complete(&messages, &[], &self.model) {
            Ok(completion) => completion.content,
            Err(err) => {
                if self.verbose {
                    tracing::warn!(error = %err, "result combination failed, falling back to concatenation");
                }
                results_text
            }
        }
    }

    /// Full turn: route, execute, combine.
    pub fn run(&self, user_input: &str) -> String {
        let routing_decision = self.route(user_input);
        let agent_results = self.execute_agents(user_input, &routing_decision);
        self.combine_results(user_input, &agent_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alm_tools;
    use crate::llm::MockLlmCaller;
    use crate::tools::ToolRegistry;
    use crate::types::LlmCompletion;

    fn all_agents(llm: Arc<dyn LlmCaller>) -> HashMap<String, BaseAgent> {
        let mut registry = ToolRegistry::new();
        alm_tools::register_all(&mut registry);
        let registry = Arc::new(registry);
        SpecialistRole::ALL
            .iter()
            .map(|role| (role.name().to_string(), BaseAgent::new(*role, llm.clone(), registry.clone(), "gpt-4")))
            .collect()
    }

    #[test]
    fn routes_to_a_single_agent_from_a_fenced_json_block() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion {
            content: "```json\n{\"agents\": [\"search_agent\"], \"parallel\": false, \"reasoning\": \"검색 작업\"}\n```".to_string(),
            tool_calls: vec![],
        }]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let decision = supervisor.route("USD 계약 찾아줘");
        assert_eq!(decision.agents, vec!["search_agent".to_string()]);
        assert!(!decision.parallel);
    }

    #[test]
    fn falls_back_to_search_agent_on_unparseable_json() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion { content: "이것은 JSON이 아닙니다".to_string(), tool_calls: vec![] }]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let decision = supervisor.route("질문");
        assert_eq!(decision.agents, vec!["search_agent".to_string()]);
    }

    #[test]
    fn falls_back_when_the_plan_names_an_unknown_agent() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion {
            content: "{\"agents\": [\"ghost_agent\"], \"parallel\": false, \"reasoning\": \"x\"}".to_string(),
            tool_calls: vec![],
        }]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let decision = supervisor.route("질문");
        assert_eq!(decision.agents, vec!["search_agent".to_string()]);
    }

    #[test]
    fn inserts_report_agent_before_a_bare_export_agent() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion {
            content: "{\"agents\": [\"analysis_agent\", \"export_agent\"], \"parallel\": false, \"reasoning\": \"x\"}".to_string(),
            tool_calls: vec![],
        }]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let decision = supervisor.route("갭 분석해서 엑셀로 내보내줘");
        assert_eq!(decision.agents, vec!["analysis_agent".to_string(), "report_agent".to_string(), "export_agent".to_string()]);
    }

    #[test]
    fn does_not_duplicate_report_agent_when_already_present() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion {
            content: "{\"agents\": [\"report_agent\", \"export_agent\"], \"parallel\": false, \"reasoning\": \"x\"}".to_string(),
            tool_calls: vec![],
        }]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let decision = supervisor.route("리포트 만들고 내보내줘");
        assert_eq!(decision.agents, vec!["report_agent".to_string(), "export_agent".to_string()]);
    }

    #[test]
    fn combine_results_returns_the_lone_success_verbatim() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let mut results = HashMap::new();
        results.insert("search_agent".to_string(), AgentResult::ok("USD 계약 15건 발견"));
        let combined = supervisor.combine_results("질문", &results);
        assert_eq!(combined, "USD 계약 15건 발견");
    }

    #[test]
    fn combine_results_reports_every_error_when_all_agents_fail() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let mut results = HashMap::new();
        results.insert("search_agent".to_string(), AgentResult::err("오류: 연결 실패"));
        let combined = supervisor.combine_results("질문", &results);
        assert!(combined.contains("search_agent"));
        assert!(combined.contains("오류: 연결 실패"));
    }

    #[test]
    fn combine_results_merges_multiple_successes_through_the_llm() {
        let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion { content: "# 통합 결과".to_string(), tool_calls: vec![] }]));
        let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
        let mut results = HashMap::new();
        results.insert("search_agent".to_string(), AgentResult::ok("검색 결과"));
        results.insert("analysis_agent".to_string(), AgentResult::ok("분석 결과"));
        let combined = supervisor.combine_results("질문", &results);
        assert_eq!(combined, "# 통합 결과");
    }
}
