//! Benchmark harness (spec §4.6): runs the same question set through the
//! single-agent ReAct loop and the multi-agent Supervisor, and reports
//! success rate, accuracy, and timing for each, overall and per category.
//!
//! Grounded in `src/benchmark.py`'s `BenchmarkRunner`. Accuracy is the same
//! deliberate simplification the original uses: "success == accurate",
//! since judging tool-selection correctness needs a human or an LLM judge
//! this harness does not implement.

pub mod report;

use crate::llm::LlmCaller;
use crate::react::ReactAgent;
use crate::supervisor::Supervisor;
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// One question in the benchmark's input dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkQuestion {
    pub id: u32,
    pub question: String,
    pub category: String,
    pub difficulty: String,
}

/// The `{"questions": [...]}` wire shape the question file uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFile {
    pub questions: Vec<BenchmarkQuestion>,
}

/// Which orchestration strategy answered a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Single,
    Multi,
}

/// The measured outcome of running one question through one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub response: Option<String>,
    pub time: f64,
    pub error: Option<String>,
    pub accurate: bool,
}

/// One question's paired single/multi outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub id: u32,
    pub question: String,
    pub category: String,
    pub difficulty: String,
    pub single: RunOutcome,
    pub multi: RunOutcome,
}

/// Aggregate statistics over one strategy's outcomes across a question set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_questions: usize,
    pub success_count: usize,
    pub success_rate: f64,
    pub accurate_count: usize,
    pub accuracy: f64,
    pub avg_time: f64,
    pub median_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub total_time: f64,
    pub std_time: f64,
}

/// Single/multi statistics for one question category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub single: Stats,
    pub multi: Stats,
}

/// The full result of one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub timestamp: String,
    pub total_questions: usize,
    pub single_agent: Stats,
    pub multi_agent: Stats,
    pub questions: Vec<QuestionResult>,
    pub category_stats: HashMap<String, CategoryStats>,
}

/// Drives both strategies over a question set.
pub struct BenchmarkRunner {
    single_agent: ReactAgent,
    supervisor: Supervisor,
    verbose: bool,
}

impl BenchmarkRunner {
    pub fn new(llm: Arc<dyn LlmCaller>, tools: Arc<ToolRegistry>, model: impl Into<String>, verbose: bool) -> Self {
        let model = model.into();
        let single_agent = ReactAgent::new(llm.clone(), tools.clone(), model.clone()).verbose(false);

        let agents = crate::agent::SpecialistRole::ALL
            .iter()
            .map(|role| (role.name().to_string(), crate::agent::BaseAgent::new(*role, llm.clone(), tools.clone(), model.clone())))
            .collect();
        let supervisor = Supervisor::new(llm, agents, model);

        Self { single_agent, supervisor, verbose }
    }

    /// Runs one question through one strategy, timing it and catching a
    /// panic the way the original's `try`/`except` catches an exception —
    /// neither orchestration path is expected to panic, but a benchmark
    /// harness measuring it shouldn't itself go down if one does.
    fn run_single_question(&self, question: &BenchmarkQuestion, strategy: Strategy) -> RunOutcome {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match strategy {
            Strategy::Single => self.single_agent.run(&question.question, &[]),
            Strategy::Multi => self.supervisor.run(&question.question),
        }));
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(response) => {
                let success = true;
                RunOutcome { success, response: Some(response), time: elapsed, error: None, accurate: Self::evaluate_accuracy(success) }
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "알 수 없는 오류".to_string());
                RunOutcome { success: false, response: None, time: elapsed, error: Some(message), accurate: false }
            }
        }
    }

    /// Accuracy here is a deliberate simplification (`src/benchmark.py`):
    /// a run that completes without erroring counts as having chosen the
    /// right tools. A real accuracy judgement would need human review or
    /// an LLM judge over the routing trace.
    fn evaluate_accuracy(success: bool) -> bool {
        success
    }

    pub fn run_benchmark(&self, questions: &[BenchmarkQuestion]) -> BenchmarkResults {
        if self.verbose {
            tracing::info!(count = questions.len(), "benchmark run start");
        }

        let mut question_results = Vec::with_capacity(questions.len());
        for q in questions {
            let single = self.run_single_question(q, Strategy::Single);
            let multi = self.run_single_question(q, Strategy::Multi);

            if self.verbose {
                tracing::info!(id = q.id, single_ok = single.success, multi_ok = multi.success, "question complete");
            }

            question_results.push(QuestionResult {
                id: q.id,
                question: q.question.clone(),
                category: q.category.clone(),
                difficulty: q.difficulty.clone(),
                single,
                multi,
            });
        }

        let single_agent = report::calculate_stats(&question_results, |r| &r.single);
        let multi_agent = report::calculate_stats(&question_results, |r| &r.multi);
        let category_stats = report::calculate_category_stats(&question_results);

        BenchmarkResults {
            timestamp: chrono::Local::now().to_rfc3339(),
            total_questions: question_results.len(),
            // `timestamp` above is the human-readable record inside the
            // results; `report::save_results_json`/`generate_markdown_report`
            // take a separate `YYYYMMDD_HHMMSS` stamp for the filenames
            // (spec §6), generated by the caller at the same instant.
            single_agent,
            multi_agent,
            questions: question_results,
            category_stats,
        }
    }
}
