//! Single-agent ReAct loop (spec §4.2): reason, act, observe, repeat until
//! the LLM stops requesting tools or the iteration cap is hit.
//!
//! Grounded in `agent.py`'s `ALMAgent.run` — including its one
//! tool-call-per-iteration rule (only `tool_calls[0]` is ever executed,
//! even if the LLM requests several at once) and its exact max-iteration
//! fallback message.

use crate::llm::LlmCaller;
use crate::prompts;
use crate::tools::{Scratch, ToolRegistry};
use crate::types::{HistoryEntry, LoopConfig, Message};
use std::sync::Arc;

const MAX_ITERATIONS_REACHED: &str = "최대 반복 횟수에 도달했습니다.";

pub struct ReactAgent {
    llm: Arc<dyn LlmCaller>,
    tools: Arc<ToolRegistry>,
    model: String,
    verbose: bool,
    config: LoopConfig,
}

impl ReactAgent {
    pub fn new(llm: Arc<dyn LlmCaller>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self { llm, tools, model: model.into(), verbose: true, config: LoopConfig::single_agent() }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Runs the loop to completion, returning the final formatted answer.
    pub fn run(&self, user_input: &str, chat_history: &[Message]) -> String {
        let enhanced_prompt = format!(
            "{user_input}\n\n분석 과정을 단계별로 진행하세요:\n\
             1. 필요한 정보 파악\n\
             2. 적절한 도구로 데이터 조회\n\
             3. 추가 정보 필요시 다른 도구 사용\n\
             4. 모든 정보를 종합하여 최종 답변"
        );

        let mut messages = vec![Message::system(prompts::SYSTEM_PROMPT)];
        messages.extend_from_slice(chat_history);
        messages.push(Message::user(enhanced_prompt));

        let mut tool_log: Vec<HistoryEntry> = Vec::new();
        let mut scratch = Scratch::new();

        for iteration in 1..=self.config.max_iterations {
            tracing::debug!(iteration, "react loop iteration");

            let schemas = self.tools.schemas();
            let completion = match self.llm.complete(&messages, &schemas, &self.model) {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!(error = %err, "llm call failed in react loop");
                    return format!("오류: LLM 호출 실패: {err}");
                }
            };

            if completion.tool_calls.is_empty() {
                tracing::debug!("react loop finished: no further tool calls");
                return self.format_response(&completion.content, &tool_log);
            }

            // Only the first requested tool call is executed per iteration,
            // matching the single-step-at-a-time ReAct discipline.
            let tool_call = &completion.tool_calls[0];
            tracing::info!(tool = %tool_call.name, iteration, "executing tool");

            let observation = self.tools.invoke(&tool_call.name, &tool_call.args, &mut scratch);
            let success = !observation.starts_with("오류");
            tool_log.push(HistoryEntry { iteration, tool: tool_call.name.clone(), success });

            messages.push(Message::user(format!(
                "[도구 실행 결과 - Iteration {iteration}]\n도구: {}\n결과:\n{observation}\n\n위 결과를 바탕으로 다음 단계를 결정하세요.",
                tool_call.name
            )));
        }

        MAX_ITERATIONS_REACHED.to_string()
    }

    fn format_response(&self, content: &str, tool_log: &[HistoryEntry]) -> String {
        if !self.verbose || tool_log.is_empty() {
            return content.to_string();
        }
        let mut summary = format!("\n\n{}\n실행 요약\n{}\n", "=".repeat(60), "=".repeat(60));
        summary.push_str(&format!("총 {}개 도구 실행\n", tool_log.len()));
        for entry in tool_log {
            let status = if entry.success { "✓" } else { "✗" };
            summary.push_str(&format!("  {status} [{}] {}\n", entry.iteration, entry.tool));
        }
        format!("{content}{summary}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alm_tools;
    use crate::llm::MockLlmCaller;
    use crate::types::{LlmCompletion, ToolCall};

    fn tools() -> Arc<ToolRegistry> {
        let mut r = ToolRegistry::new();
        alm_tools::register_all(&mut r);
        Arc::new(r)
    }

    #[test]
    fn stops_as_soon_as_the_llm_stops_requesting_tools() {
        let mock = MockLlmCaller::new(vec![LlmCompletion { content: "최종 답변입니다.".to_string(), tool_calls: vec![] }]);
        let agent = ReactAgent::new(Arc::new(mock), tools(), "gpt-4").verbose(false);
        let out = agent.run("USD 환율 알려줘", &[]);
        assert_eq!(out, "최종 답변입니다.");
    }

    #[test]
    fn executes_only_the_first_tool_call_per_iteration() {
        let mock = MockLlmCaller::new(vec![
            LlmCompletion {
                content: String::new(),
                tool_calls: vec![
                    ToolCall { name: "get_exchange_rate".to_string(), args: serde_json::json!({"from_currency": "USD", "to_currency": "KRW"}) },
                    ToolCall { name: "get_interest_rate".to_string(), args: serde_json::json!({"rate_cd": "X"}) },
                ],
            },
            LlmCompletion { content: "환율 정보를 확인했습니다.".to_string(), tool_calls: vec![] },
        ]);
        let mock = Arc::new(mock);
        let agent = ReactAgent::new(mock.clone(), tools(), "gpt-4").verbose(false);
        let out = agent.run("환율과 금리를 모두 알려줘", &[]);
        assert_eq!(out, "환율 정보를 확인했습니다.");
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn hits_the_iteration_cap_gracefully() {
        let responses: Vec<LlmCompletion> = (0..20)
            .map(|_| LlmCompletion {
                content: String::new(),
                tool_calls: vec![ToolCall { name: "search_alm_contracts".to_string(), args: serde_json::json!({}) }],
            })
            .collect();
        let agent = ReactAgent::new(Arc::new(MockLlmCaller::new(responses)), tools(), "gpt-4").verbose(false);
        let out = agent.run("끝없이 검색해줘", &[]);
        assert_eq!(out, MAX_ITERATIONS_REACHED);
    }
}
