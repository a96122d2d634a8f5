//! End-to-end scenarios across the ReAct loop, the Supervisor, and the
//! workflow state machine, all driven by `MockLlmCaller` — no network
//! calls are made.
//!
//! Run with: `cargo test`

use almagent::agent::{BaseAgent, SpecialistRole};
use almagent::llm::{LlmCaller, MockLlmCaller};
use almagent::tools::ToolRegistry;
use almagent::types::{LlmCompletion, Message, ToolCall};
use almagent::workflow::WorkflowEngine;
use almagent::{alm_tools, Supervisor};
use std::collections::HashMap;
use std::sync::Arc;

fn tools() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    alm_tools::register_all(&mut registry);
    Arc::new(registry)
}

fn all_agents(llm: Arc<dyn LlmCaller>) -> HashMap<String, BaseAgent> {
    let registry = tools();
    SpecialistRole::ALL
        .iter()
        .map(|role| (role.name().to_string(), BaseAgent::new(*role, llm.clone(), registry.clone(), "gpt-4")))
        .collect()
}

fn tool_call(name: &str, args: serde_json::Value) -> LlmCompletion {
    LlmCompletion { content: String::new(), tool_calls: vec![ToolCall { name: name.to_string(), args }] }
}

fn final_answer(content: &str) -> LlmCompletion {
    LlmCompletion { content: content.to_string(), tool_calls: vec![] }
}

// S1 — pure search, single tool call, single-agent ReAct loop.
#[test]
fn s1_single_agent_search_round_trip() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        tool_call("search_alm_contracts", serde_json::json!({ "filters_json": "{\"CURRENCY_CD\":\"USD\"}" })),
        final_answer("USD 계약 3건이 있습니다."),
    ]));
    let agent = almagent::ReactAgent::new(llm, tools(), "gpt-4").verbose(false);

    let out = agent.run("USD 통화 계약을 찾아줘", &[]);
    assert_eq!(out, "USD 계약 3건이 있습니다.");
}

// S2 — analysis then report, sequential multi-agent plan via the
// Supervisor's straight-through `run()`.
#[test]
fn s2_analysis_then_report_sequential() {
    let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![
        LlmCompletion {
            content: "```json\n{\"agents\": [\"analysis_agent\", \"report_agent\"], \"parallel\": false, \"reasoning\": \"분석 후 리포트\"}\n```"
                .to_string(),
            tool_calls: vec![],
        },
        tool_call("analyze_liquidity_gap", serde_json::json!({})),
        final_answer("유동성 갭 분석 결과: 총갭 -82,340백만원"),
        tool_call("generate_comprehensive_report", serde_json::json!({})),
        final_answer("종합 리포트가 생성되었습니다."),
        final_answer("# 유동성 갭 분석 및 리포트\n\n두 결과를 통합했습니다."),
    ]));
    let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");

    let decision = supervisor.route("유동성 갭을 분석하고 리포트를 생성해줘");
    let results = supervisor.execute_agents("유동성 갭을 분석하고 리포트를 생성해줘", &decision);

    let mut keys: Vec<&String> = results.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["analysis_agent", "report_agent"]);
    assert!(results["analysis_agent"].success);
    assert!(results["report_agent"].success);

    let combined = supervisor.combine_results("유동성 갭을 분석하고 리포트를 생성해줘", &results);
    assert!(combined.contains("통합"));
}

// S3 — router fallback on garbage input; search_agent still runs normally.
#[test]
fn s3_router_fallback_on_garbage_then_search_runs() {
    let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![
        LlmCompletion { content: "not json at all".to_string(), tool_calls: vec![] },
        tool_call("search_alm_contracts", serde_json::json!({ "filters_json": "{}" })),
        final_answer("검색을 완료했습니다."),
    ]));
    let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");

    let decision = supervisor.route("???");
    assert_eq!(decision.agents, vec!["search_agent".to_string()]);
    assert!(!decision.parallel);
    assert!(decision.reasoning.contains("JSON 파싱 오류") || decision.reasoning.to_lowercase().contains("routing error"));

    let results = supervisor.execute_agents("???", &decision);
    assert!(results["search_agent"].success);
}

// S4 — max-iteration guard: with the cap already exhausted, the
// supervisor node forces `finish` on its very first tick without
// consulting the LLM, and the combiner still produces a final response.
#[test]
fn s4_max_iteration_guard_forces_finish() {
    let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![]));
    let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
    let engine = WorkflowEngine::new(&supervisor);

    let state = engine.run("끝없이 검색해줘", 0).unwrap();
    assert_eq!(state.iteration, 1);
    assert!(!state.errors.is_empty());
    assert!(state.agent_results.is_empty());
    assert!(!state.final_response.is_empty());
}

// S5 — a tool error surfaces as an observation, not an exception; the
// specialist still returns a successful AgentResult.
#[test]
fn s5_tool_error_surfaces_as_observation_not_exception() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        tool_call("search_alm_contracts", serde_json::json!({ "filters_json": "not-an-object" })),
        final_answer("죄송합니다. 현재 DB 연결에 문제가 있어 검색할 수 없습니다."),
    ]));
    let agent = BaseAgent::new(SpecialistRole::Search, llm, tools(), "gpt-4");

    let result = agent.run("USD 계약 찾아줘", None, &mut almagent::tools::Scratch::new());
    assert!(result.success);
    assert!(result.result.unwrap().contains("죄송합니다"));
}

// S6 — benchmark aggregates over three fixed timings.
#[test]
fn s6_benchmark_aggregates_match_fixed_inputs() {
    use almagent::benchmark::report::calculate_stats;
    use almagent::benchmark::{QuestionResult, RunOutcome};

    fn outcome(time: f64) -> RunOutcome {
        RunOutcome { success: true, response: Some("ok".to_string()), time, error: None, accurate: true }
    }

    let questions: Vec<QuestionResult> = [1.0, 2.0, 3.0]
        .iter()
        .enumerate()
        .map(|(i, &t)| QuestionResult {
            id: i as u32,
            question: format!("q{i}"),
            category: "search".to_string(),
            difficulty: "easy".to_string(),
            single: outcome(t),
            multi: outcome(t),
        })
        .collect();

    let stats = calculate_stats(&questions, |r| &r.single);
    assert_eq!(stats.avg_time, 2.0);
    assert_eq!(stats.median_time, 2.0);
    assert_eq!(stats.success_rate, 100.0);
    assert_eq!(stats.accuracy, 100.0);
}

// Testable property 3 — each specialist's tool surface is exactly its
// declared required set, never more.
#[test]
fn specialist_tool_subsets_match_the_declared_roles() {
    let registry = tools();
    for role in SpecialistRole::ALL {
        let schemas = registry.schemas_for(role.required_tools());
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), role.required_tools().len());
        for required in role.required_tools() {
            assert!(names.contains(required));
        }
    }
}

// Testable property 6 — export_agent is never routed before report_agent.
#[test]
fn export_is_always_preceded_by_report_even_if_the_router_forgets() {
    let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![LlmCompletion {
        content: "{\"agents\": [\"export_agent\"], \"parallel\": false, \"reasoning\": \"내보내기만 요청\"}".to_string(),
        tool_calls: vec![],
    }]));
    let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");

    let decision = supervisor.route("리포트를 엑셀로 내보내줘");
    assert_eq!(decision.agents, vec!["report_agent".to_string(), "export_agent".to_string()]);
}

// Empty plan maps to the combiner's all-failed path once executed with no
// agents run — exercised at the workflow level via the supervisor tick.
#[test]
fn empty_routing_plan_goes_straight_to_combiner() {
    let llm: Arc<dyn LlmCaller> = Arc::new(MockLlmCaller::new(vec![
        LlmCompletion { content: "{\"agents\": [], \"parallel\": false, \"reasoning\": \"추가 작업 불필요\"}".to_string(), tool_calls: vec![] },
    ]));
    let supervisor = Supervisor::new(llm.clone(), all_agents(llm), "gpt-4");
    let engine = WorkflowEngine::new(&supervisor);

    let state = engine.run("고마워요", 10).unwrap();
    assert!(state.agent_results.is_empty());
    assert!(!state.final_response.is_empty());
}

// Prior turns passed as `chat_history` reach the LLM call, not just the
// current question.
#[test]
fn chat_history_is_threaded_into_the_react_loop() {
    let llm = Arc::new(MockLlmCaller::new(vec![final_answer("이전 대화를 참고했습니다.")]));
    let history = vec![Message::user("이전 질문"), Message::assistant("이전 답변")];
    let agent = almagent::ReactAgent::new(llm.clone(), tools(), "gpt-4").verbose(false);

    let out = agent.run("이어서 질문할게요", &history);
    assert_eq!(out, "이전 대화를 참고했습니다.");
    assert_eq!(llm.call_count(), 1);
    assert_eq!(llm.model_for_call(0), Some("gpt-4".to_string()));
}
