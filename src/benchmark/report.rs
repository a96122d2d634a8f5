//! Statistics and report generation for [`super::BenchmarkResults`] —
//! grounded in `src/benchmark.py`'s `calculate_stats`/`calculate_category_stats`/
//! `save_results`/`generate_report`.

use super::{BenchmarkResults, CategoryStats, QuestionResult, RunOutcome, Stats};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Aggregates one strategy's outcomes, picked out of each `QuestionResult`
/// by `pick`, into success/accuracy/timing statistics.
pub fn calculate_stats(results: &[QuestionResult], pick: impl Fn(&QuestionResult) -> &RunOutcome) -> Stats {
    let total_questions = results.len();
    if total_questions == 0 {
        return Stats::default();
    }

    let outcomes: Vec<&RunOutcome> = results.iter().map(&pick).collect();
    let success_count = outcomes.iter().filter(|o| o.success).count();
    let accurate_count = outcomes.iter().filter(|o| o.accurate).count();

    let mut times: Vec<f64> = outcomes.iter().filter(|o| o.success).map(|o| o.time).collect();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let (avg_time, median_time, min_time, max_time, total_time, std_time) = if times.is_empty() {
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    } else {
        let total_time: f64 = times.iter().sum();
        let avg_time = total_time / times.len() as f64;
        let median_time = median(&times);
        let min_time = times[0];
        let max_time = times[times.len() - 1];
        let variance = times.iter().map(|t| (t - avg_time).powi(2)).sum::<f64>() / times.len() as f64;
        (avg_time, median_time, min_time, max_time, total_time, variance.sqrt())
    };

    Stats {
        total_questions,
        success_count,
        success_rate: success_count as f64 / total_questions as f64 * 100.0,
        accurate_count,
        accuracy: accurate_count as f64 / total_questions as f64 * 100.0,
        avg_time,
        median_time,
        min_time,
        max_time,
        total_time,
        std_time,
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Breaks statistics down per question category.
pub fn calculate_category_stats(results: &[QuestionResult]) -> HashMap<String, CategoryStats> {
    let mut categories: Vec<&String> = results.iter().map(|r| &r.category).collect();
    categories.sort();
    categories.dedup();

    categories
        .into_iter()
        .map(|category| {
            let subset: Vec<QuestionResult> = results.iter().filter(|r| &r.category == category).cloned().collect();
            let single = calculate_stats(&subset, |r| &r.single);
            let multi = calculate_stats(&subset, |r| &r.multi);
            (category.clone(), CategoryStats { single, multi })
        })
        .collect()
}

/// Writes the full results as pretty-printed JSON, returning the path.
pub fn save_results_json(results: &BenchmarkResults, save_dir: &Path, timestamp: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(save_dir)?;
    let path = save_dir.join(format!("results_{timestamp}.json"));
    let json = serde_json::to_string_pretty(results).expect("BenchmarkResults is always serializable");
    fs::write(&path, json)?;
    Ok(path)
}

/// Writes the Markdown summary report, returning the path.
pub fn generate_markdown_report(results: &BenchmarkResults, save_dir: &Path, timestamp: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(save_dir)?;
    let path = save_dir.join(format!("report_{timestamp}.md"));
    fs::write(&path, render_markdown(results))?;
    Ok(path)
}

fn improvement(single: f64, multi: f64) -> String {
    if single == 0.0 {
        return "N/A".to_string();
    }
    let change = (multi - single) / single * 100.0;
    let sign = if change > 0.0 { "+" } else { "" };
    format!("{sign}{change:.1}%")
}

fn render_markdown(results: &BenchmarkResults) -> String {
    let single = &results.single_agent;
    let multi = &results.multi_agent;

    let mut out = String::new();
    out.push_str("# ALM 챗봇 벤치마크 결과\n\n");
    out.push_str("## 실행 정보\n");
    out.push_str(&format!("- **실행 시간**: {}\n", results.timestamp));
    out.push_str(&format!("- **총 질문 수**: {}\n\n", results.total_questions));
    out.push_str("---\n\n## 📊 요약\n\n");
    out.push_str("| 지표 | 단일 에이전트 | 멀티 에이전트 | 개선율 |\n");
    out.push_str("|------|--------------|--------------|--------|\n");
    out.push_str(&format!(
        "| **성공률** | {:.1}% | {:.1}% | {} |\n",
        single.success_rate,
        multi.success_rate,
        improvement(single.success_rate, multi.success_rate)
    ));
    out.push_str(&format!("| **정확도** | {:.1}% | {:.1}% | {} |\n", single.accuracy, multi.accuracy, improvement(single.accuracy, multi.accuracy)));
    out.push_str(&format!(
        "| **평균 응답 시간** | {:.2}초 | {:.2}초 | {} |\n",
        single.avg_time,
        multi.avg_time,
        improvement(single.avg_time, multi.avg_time)
    ));
    out.push_str(&format!(
        "| **중앙값 응답 시간** | {:.2}초 | {:.2}초 | {} |\n",
        single.median_time,
        multi.median_time,
        improvement(single.median_time, multi.median_time)
    ));
    out.push_str(&format!("| **최소 응답 시간** | {:.2}초 | {:.2}초 | - |\n", single.min_time, multi.min_time));
    out.push_str(&format!("| **최대 응답 시간** | {:.2}초 | {:.2}초 | - |\n", single.max_time, multi.max_time));
    out.push_str(&format!(
        "| **총 실행 시간** | {:.2}초 | {:.2}초 | {} |\n\n",
        single.total_time,
        multi.total_time,
        improvement(single.total_time, multi.total_time)
    ));

    out.push_str("---\n\n## 📈 카테고리별 성능\n\n");
    let mut categories: Vec<&String> = results.category_stats.keys().collect();
    categories.sort();
    for category in categories {
        let stats = &results.category_stats[category];
        out.push_str(&format!("### {} 카테고리 ({}개 질문)\n\n", category.to_uppercase(), stats.single.total_questions));
        out.push_str("| 지표 | 단일 | 멀티 |\n|------|------|------|\n");
        out.push_str(&format!("| 성공률 | {:.1}% | {:.1}% |\n", stats.single.success_rate, stats.multi.success_rate));
        out.push_str(&format!("| 정확도 | {:.1}% | {:.1}% |\n", stats.single.accuracy, stats.multi.accuracy));
        out.push_str(&format!("| 평균 시간 | {:.2}초 | {:.2}초 |\n\n", stats.single.avg_time, stats.multi.avg_time));
    }

    let single_failures: Vec<&QuestionResult> = results.questions.iter().filter(|q| !q.single.success).collect();
    let multi_failures: Vec<&QuestionResult> = results.questions.iter().filter(|q| !q.multi.success).collect();

    out.push_str(&format!("---\n\n## ❌ 실패 사례 분석\n\n### 단일 에이전트 실패 ({}개)\n\n", single_failures.len()));
    if single_failures.is_empty() {
        out.push_str("실패 없음\n\n");
    } else {
        for q in single_failures.iter().take(5) {
            out.push_str(&format!(
                "- **질문 {}** ({}): {}\n  - 오류: {}\n\n",
                q.id,
                q.category,
                q.question,
                q.single.error.as_deref().unwrap_or("알 수 없는 오류")
            ));
        }
    }

    out.push_str(&format!("### 멀티 에이전트 실패 ({}개)\n\n", multi_failures.len()));
    if multi_failures.is_empty() {
        out.push_str("실패 없음\n\n");
    } else {
        for q in multi_failures.iter().take(5) {
            out.push_str(&format!(
                "- **질문 {}** ({}): {}\n  - 오류: {}\n\n",
                q.id,
                q.category,
                q.question,
                q.multi.error.as_deref().unwrap_or("알 수 없는 오류")
            ));
        }
    }

    out.push_str("---\n\n## 🎯 결론\n\n### 정확도\n");
    if multi.accuracy > single.accuracy {
        out.push_str(&format!("✅ **멀티 에이전트가 {:.1}%p 더 정확**합니다.\n\n", multi.accuracy - single.accuracy));
    } else {
        out.push_str(&format!("⚠️ 단일 에이전트가 {:.1}%p 더 정확합니다.\n\n", single.accuracy - multi.accuracy));
    }

    out.push_str("### 응답 시간\n");
    if multi.avg_time < single.avg_time {
        out.push_str(&format!("⚡ **멀티 에이전트가 평균 {:.2}초 더 빠릅니다**.\n\n", single.avg_time - multi.avg_time));
    } else {
        out.push_str(&format!("🐢 멀티 에이전트가 평균 {:.2}초 더 느립니다 (라우팅 오버헤드).\n\n", multi.avg_time - single.avg_time));
    }

    out.push_str("### 종합 평가\n\n");
    out.push_str(&format!("- **단일 에이전트**: {}/{} 성공, 평균 {:.2}초\n", single.success_count, single.total_questions, single.avg_time));
    out.push_str(&format!("- **멀티 에이전트**: {}/{} 성공, 평균 {:.2}초\n\n", multi.success_count, multi.total_questions, multi.avg_time));
    let recommendation = if multi.accuracy >= single.accuracy { "멀티 에이전트" } else { "단일 에이전트" };
    out.push_str(&format!("**권장사항**: {recommendation} 사용 권장\n\n---\n\n"));
    out.push_str(&format!("**생성 시간**: {}\n", results.timestamp));

    out
}
