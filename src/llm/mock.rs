use crate::llm::LlmCaller;
use crate::tools::ToolSchema;
use crate::types::{LlmCompletion, Message};
use std::sync::Mutex;

/// Scripted `LlmCaller` for tests — returns programmed completions in
/// order, recording each call for assertions.
pub struct MockLlmCaller {
    responses: Mutex<Vec<LlmCompletion>>,
    call_log: Mutex<Vec<(String, usize)>>, // (model, messages.len())
}

impl MockLlmCaller {
    pub fn new(responses: Vec<LlmCompletion>) -> Self {
        Self { responses: Mutex::new(responses), call_log: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    pub fn model_for_call(&self, n: usize) -> Option<String> {
        self.call_log.lock().unwrap().get(n).map(|(model, _)| model.clone())
    }
}

impl LlmCaller for MockLlmCaller {
    fn complete(&self, messages: &[Message], _tools: &[ToolSchema], model: &str) -> Result<LlmCompletion, String> {
        self.call_log.lock().unwrap().push((model.to_string(), messages.len()));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err("MockLlmCaller: no more programmed responses".to_string());
        }
        Ok(responses.remove(0))
    }
}
