//! Benchmark CLI binary: runs a question set through both orchestration
//! strategies and writes a JSON + Markdown report (spec §6).
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --bin alm-benchmark -- --questions test_questions.json
//! RUST_LOG=debug cargo run --bin alm-benchmark -- --sample 10 --verbose
//! ```

use almagent::benchmark::{report, BenchmarkRunner, QuestionFile};
use almagent::llm::OpenAiCaller;
use almagent::tools::ToolRegistry;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "alm-benchmark")]
#[command(about = "Compare single-agent and multi-agent ALM orchestration")]
struct Args {
    /// Question dataset JSON path
    #[arg(long, default_value = "test_questions.json")]
    questions: PathBuf,

    /// Output directory for the JSON and Markdown reports
    #[arg(long, default_value = "benchmark_results")]
    output: PathBuf,

    /// Only run the first N questions (for a quick smoke run)
    #[arg(long)]
    sample: Option<usize>,

    /// Verbose logging
    #[arg(long)]
    verbose: bool,

    /// Model name passed to the LLM adapter
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if !args.questions.exists() {
        anyhow::bail!("question dataset not found: {}", args.questions.display());
    }

    let raw = std::fs::read_to_string(&args.questions).with_context(|| format!("reading {}", args.questions.display()))?;
    let mut question_file: QuestionFile = serde_json::from_str(&raw).context("parsing question dataset JSON")?;
    if let Some(n) = args.sample {
        question_file.questions.truncate(n);
        println!("샘플 모드: {n}개 질문만 실행");
    }

    let llm = Arc::new(almagent::llm::SyncWrapper(OpenAiCaller::new()));
    let mut registry = ToolRegistry::new();
    almagent::alm_tools::register_all(&mut registry);
    let tools = Arc::new(registry);

    let runner = BenchmarkRunner::new(llm, tools, args.model, args.verbose);

    println!("{}", "=".repeat(60));
    println!("벤치마크 실행 시작: {}개 질문", question_file.questions.len());
    println!("{}", "=".repeat(60));

    let results = runner.run_benchmark(&question_file.questions);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let json_path = report::save_results_json(&results, &args.output, &timestamp)?;
    let md_path = report::generate_markdown_report(&results, &args.output, &timestamp)?;

    println!("\n{}", "=".repeat(60));
    println!("✅ 벤치마크 완료!");
    println!("{}", "=".repeat(60));
    println!("JSON 결과: {}", json_path.display());
    println!("마크다운 리포트: {}", md_path.display());
    println!(
        "단일 에이전트: {:.1}% 정확도, {:.2}초 평균",
        results.single_agent.accuracy, results.single_agent.avg_time
    );
    println!("멀티 에이전트: {:.1}% 정확도, {:.2}초 평균", results.multi_agent.accuracy, results.multi_agent.avg_time);

    Ok(())
}
