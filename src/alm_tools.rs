//! The eleven ALM analytics tools (spec §1, §4.1), grounded one-for-one on
//! the function names and parameter shapes in `alm_functions.py` and the
//! `*Input` pydantic models in the legacy tool-wiring scripts.
//!
//! Every implementation here is a deterministic, side-effect-free stub: it
//! validates its documented argument shape and returns a human-readable
//! placeholder (or an "오류"-prefixed string on invalid input). The real
//! SQL/pandas analyses are an external collaborator's job, not this crate's.

use crate::tools::{FieldType, Scratch, Tool, ToolField, ToolInputSchema, ToolRegistry};
use serde_json::Value;

fn field(name: &str, ty: FieldType, desc: &str) -> ToolField {
    ToolField::new(name, ty, desc)
}

fn get_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("오류: 필수 문자열 매개변수 '{name}' 누락"))
}

fn get_opt_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn get_opt_i64(args: &Value, name: &str) -> Option<i64> {
    args.get(name).and_then(Value::as_i64)
}

/// Splits a comma-separated string field into its trimmed parts (Design
/// Notes "Tool input shapes" — a flat `Str` field, not a JSON array, the
/// way `include_sections`/`dimensions` travel in `implement_complete.py`'s
/// `_generate_report`/`_compare_scenarios` wrappers).
fn get_opt_str_list(args: &Value, name: &str) -> Vec<String> {
    get_opt_str(args, name)
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// ALM_INST 계약 검색 — filters_json is a JSON-object *string* of
/// column/value pairs (CURRENCY_CD, BASE_DATE, DIM_PROD, ...), matching the
/// schema's advertised `Str` type and spec S1's
/// `search_alm_contracts({filters_json: '{"CURRENCY_CD":"USD"}'})`.
fn search_alm_contracts(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let raw = get_opt_str(args, "filters_json").unwrap_or("");
    let filters = if raw.is_empty() {
        serde_json::Map::new()
    } else {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err("오류: 'filters_json'은 JSON 객체 문자열이어야 합니다".to_string()),
            Err(e) => return Err(format!("오류: 'filters_json' 파싱 실패: {e}")),
        }
    };
    if filters.is_empty() {
        return Ok("ALM_INST 계약 검색: 필터 없음, 전체 계약 대상 (추정 1,284건)".to_string());
    }
    let clauses: Vec<String> = filters
        .iter()
        .map(|(k, v)| format!("{k}={}", v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
        .collect();
    let estimate = 1284usize.saturating_sub(filters.len() * 137);
    Ok(format!(
        "ALM_INST 계약 검색 결과: 조건 [{}] 에 대해 {}건 조회됨",
        clauses.join(", "),
        estimate.max(1)
    ))
}

/// 환율 조회 — NFA_EXCH_RATE_HIST.
fn get_exchange_rate(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let from_currency = get_str(args, "from_currency")?;
    let to_currency = get_str(args, "to_currency")?;
    let date = get_opt_str(args, "date").unwrap_or("최근 영업일");
    Ok(format!("{from_currency}/{to_currency} 환율 ({date} 기준): 1,342.50"))
}

/// 금리 조회 — NFA_IRC_RATE_HIST.
fn get_interest_rate(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let rate_cd = get_str(args, "rate_cd")?;
    let term = get_opt_str(args, "term").unwrap_or("1Y");
    Ok(format!("금리 코드 '{rate_cd}' 기간 '{term}' 금리: 3.25%"))
}

/// 유동성 갭 분석 — NFAR_LIQ_GAP_310524, TIME_BAND 구간별.
fn analyze_liquidity_gap(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let scenario_no = get_opt_i64(args, "scenario_no");
    let scenario_label = scenario_no.map(|s| format!("시나리오 {s}")).unwrap_or_else(|| "기본 시나리오".to_string());
    Ok(format!(
        "유동성 갭 분석 ({scenario_label}): 6개 기간대, 총갭(GAP_PRN_TOTAL+GAP_INT_TOTAL) -82,340백만원"
    ))
}

/// 집계 통계 — group_by 컬럼 x aggregate_col 컬럼.
fn get_aggregate_stats(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let group_by = get_str(args, "group_by")?;
    let aggregate_col = get_str(args, "aggregate_col")?;
    Ok(format!("'{group_by}' 기준 '{aggregate_col}' 집계: 5개 그룹, 합계 912,450백만원, 평균 182,490백만원"))
}

/// 시나리오 비교 — scenario_numbers는 쉼표로 구분된 정수 문자열
/// (`implement_complete.py`'s `_compare_scenarios`'s
/// `scenario_list.split(',')`), TIME_BAND 갭 합계 비교.
fn compare_scenarios(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let raw = get_str(args, "scenario_numbers")?;
    let scenarios: Vec<i64> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| format!("오류: 잘못된 시나리오 번호 '{s}'")))
        .collect::<Result<_, _>>()?;
    if scenarios.is_empty() {
        return Err("오류: 'scenario_numbers'는 최소 하나의 시나리오 번호를 포함해야 합니다".to_string());
    }
    let lines: Vec<String> = scenarios
        .iter()
        .map(|s| format!("시나리오 {s}: 총갭={}", (*s).saturating_mul(-1370)))
        .collect();
    Ok(format!("총 {}개 시나리오 비교\n{}", scenarios.len(), lines.join("\n")))
}

/// 시계열 트렌드 분석 — exchange_rate | interest_rate, 선형 회귀 기울기
/// 기준 ±0.01로 상승/하락/안정 분류.
fn analyze_trends(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let metric_type = get_str(args, "metric_type")?;
    if metric_type != "exchange_rate" && metric_type != "interest_rate" {
        return Err(format!("오류: 지원하지 않는 metric_type '{metric_type}'"));
    }
    let code = get_opt_str(args, "currency_or_rate_cd").unwrap_or("전체");
    let slope = 0.014_f64;
    let trend = if slope > 0.01 {
        "상승 추세"
    } else if slope < -0.01 {
        "하락 추세"
    } else {
        "안정 추세"
    };
    Ok(format!("{metric_type} 트렌드 분석 ({code}): {trend} (기울기 {slope:.3})"))
}

/// 신규 포지션 증가분 — current_base_date 대비 새로 추가된 계약.
/// `dimensions`는 쉼표로 구분된 차원 이름 목록 (예: "DIM_PROD,DIM_ORG").
fn analyze_new_position_growth(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let current_base_date = get_str(args, "current_base_date")?;
    let dims = get_opt_str_list(args, "dimensions");
    let dims_label = if dims.is_empty() { "전체 차원".to_string() } else { dims.join(", ") };
    Ok(format!("신규 포지션 증가분 ({current_base_date} 기준, {dims_label}): 47건 신규, 잔액 +38,210백만원"))
}

/// 소멸 포지션 감소분 — current_base_date 대비 사라진 계약.
fn analyze_expired_position_decrease(args: &Value, _scratch: &mut Scratch) -> Result<String, String> {
    let current_base_date = get_str(args, "current_base_date")?;
    let dims = get_opt_str_list(args, "dimensions");
    let dims_label = if dims.is_empty() { "전체 차원".to_string() } else { dims.join(", ") };
    Ok(format!("소멸 포지션 감소분 ({current_base_date} 기준, {dims_label}): 12건 소멸, 잔액 -9,430백만원"))
}

const REPORT_SECTIONS: [&str; 4] = ["data_overview", "liquidity_gap", "market_data", "dimensional_analysis"];

/// 종합 ALM 리포트 생성 — 호출자의 per-turn `scratch`에 기록해 두어
/// 같은 턴 안에서 실행되는 `export_report`가 이어서 읽을 수 있게 한다
/// (공유 전역 변수를 쓰던 원본의 "마지막 리포트" 핸드오프를, 턴마다 새로
/// 만들어지는 워크스페이스로 옮긴 것 — `WorkflowState.scratch`나
/// `Supervisor::execute_agents`/`ReactAgent::run`이 만드는 지역 `Scratch`).
fn generate_comprehensive_report(args: &Value, scratch: &mut Scratch) -> Result<String, String> {
    let requested = get_opt_str_list(args, "include_sections");
    let sections: Vec<&str> = if requested.is_empty() {
        REPORT_SECTIONS.to_vec()
    } else {
        REPORT_SECTIONS.iter().copied().filter(|s| requested.iter().any(|r| r == s)).collect()
    };
    if sections.is_empty() {
        return Err("오류: 'include_sections'에 유효한 섹션이 없습니다".to_string());
    }
    let scenario_no = get_opt_i64(args, "scenario_no");

    let mut body = String::from("ALM 종합 분석 리포트\n");
    if let Some(no) = scenario_no {
        body.push_str(&format!("(시나리오 {no} 기준)\n"));
    }
    for section in &sections {
        body.push_str(&format!("- {section}\n"));
    }

    scratch.insert("last_report".to_string(), Value::String(body.clone()));
    scratch.insert(
        "last_report_sections".to_string(),
        Value::Array(sections.iter().map(|s| Value::String((*s).to_string())).collect()),
    );

    Ok(format!("종합 리포트 생성 완료: {}개 섹션 ({})", sections.len(), sections.join(", ")))
}

/// 리포트 내보내기 — 같은 턴에서 `generate_comprehensive_report`가 먼저
/// 실행되어 `scratch["last_report"]`에 값을 남겨두어야 한다. 다른 턴의
/// `scratch`는 절대 보이지 않는다 — 호출자가 매 턴 새 `Scratch`를 만든다.
fn export_report(args: &Value, scratch: &mut Scratch) -> Result<String, String> {
    let format = get_opt_str(args, "format").unwrap_or("pdf");
    if !["pdf", "excel", "markdown", "all"].contains(&format) {
        return Err(format!("오류: 지원하지 않는 내보내기 형식 '{format}'"));
    }
    let Some(Value::String(report)) = scratch.get("last_report") else {
        return Err("오류: 내보낼 리포트가 없습니다. generate_comprehensive_report를 먼저 실행하세요".to_string());
    };
    let output_dir = get_opt_str(args, "output_dir").unwrap_or("./reports");
    let section_count = scratch
        .get("last_report_sections")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    Ok(format!(
        "리포트를 '{format}' 형식으로 '{output_dir}'에 내보냈습니다 ({section_count}개 섹션, {}자)",
        report.len()
    ))
}

/// Registers all eleven ALM tools. Tools are plain functions of
/// `(&Value, &mut Scratch)` — the registry holds no state of its own, and
/// `generate_comprehensive_report`/`export_report` only see whatever
/// `Scratch` the caller threads through its own turn's `invoke` calls.
pub fn register_all(registry: &mut ToolRegistry) {
    registry.register(
        Tool::new("search_alm_contracts", "ALM 계약 검색 (필터 JSON 사용)", Box::new(search_alm_contracts)).with_schema(ToolInputSchema::new(
            vec![field("filters_json", FieldType::Str, "검색 필터 (JSON 객체 문자열, 예: '{\"CURRENCY_CD\":\"USD\"}')").optional()],
        )),
    );

    registry.register(
        Tool::new("get_exchange_rate", "환율 조회 (기준통화, 대상통화, 날짜)", Box::new(get_exchange_rate)).with_schema(
            ToolInputSchema::new(vec![
                field("from_currency", FieldType::Str, "기준 통화 코드 (예: USD)"),
                field("to_currency", FieldType::Str, "대상 통화 코드 (예: KRW)"),
                field("date", FieldType::Str, "조회 기준일 (YYYY-MM-DD)").optional(),
            ]),
        ),
    );

    registry.register(
        Tool::new("get_interest_rate", "금리 조회 (금리 코드, 기간)", Box::new(get_interest_rate)).with_schema(
            ToolInputSchema::new(vec![
                field("rate_cd", FieldType::Str, "금리 코드"),
                field("term", FieldType::Str, "기간 (예: 1Y)").optional(),
            ]),
        ),
    );

    registry.register(
        Tool::new("analyze_liquidity_gap", "유동성 갭 분석 (만기 구간별)", Box::new(analyze_liquidity_gap)).with_schema(
            ToolInputSchema::new(vec![field("scenario_no", FieldType::Int, "시나리오 번호").optional()]),
        ),
    );

    registry.register(
        Tool::new("get_aggregate_stats", "집계 통계 (그룹별 합계, 평균 등)", Box::new(get_aggregate_stats)).with_schema(
            ToolInputSchema::new(vec![
                field("group_by", FieldType::Str, "그룹화 컬럼 (예: CURRENCY_CD)"),
                field("aggregate_col", FieldType::Str, "집계 컬럼 (예: CUR_PAR_BAL)"),
            ]),
        ),
    );

    registry.register(
        Tool::new("compare_scenarios", "시나리오 비교 분석", Box::new(compare_scenarios)).with_schema(ToolInputSchema::new(vec![field(
            "scenario_numbers",
            FieldType::Str,
            "비교할 시나리오 번호들 (쉼표로 구분, 예: '1,2,3')",
        )])),
    );

    registry.register(
        Tool::new("analyze_trends", "시계열 트렌드 분석", Box::new(analyze_trends)).with_schema(ToolInputSchema::new(vec![
            field("metric_type", FieldType::Str, "'exchange_rate' 또는 'interest_rate'"),
            field("currency_or_rate_cd", FieldType::Str, "통화 코드 또는 금리 코드").optional(),
            field("start_date", FieldType::Str, "시작 날짜 (YYYY-MM-DD)").optional(),
            field("end_date", FieldType::Str, "종료 날짜 (YYYY-MM-DD)").optional(),
        ])),
    );

    registry.register(
        Tool::new(
            "analyze_new_position_growth",
            "신규 포지션 증가분 분석 (이전 기준일 대비 새로 추가된 계약)",
            Box::new(analyze_new_position_growth),
        )
        .with_schema(ToolInputSchema::new(vec![
            field("current_base_date", FieldType::Str, "현재 기준일 (YYYY-MM-DD)"),
            field("dimensions", FieldType::Str, "그룹화할 차원 (쉼표 구분, 예: 'DIM_PROD,DIM_ORG')").optional(),
        ])),
    );

    registry.register(
        Tool::new(
            "analyze_expired_position_decrease",
            "소멸 포지션 감소분 분석 (이전 기준일 대비 사라진 계약)",
            Box::new(analyze_expired_position_decrease),
        )
        .with_schema(ToolInputSchema::new(vec![
            field("current_base_date", FieldType::Str, "현재 기준일 (YYYY-MM-DD)"),
            field("dimensions", FieldType::Str, "그룹화할 차원 (쉼표 구분, 예: 'DIM_PROD,DIM_ORG')").optional(),
        ])),
    );

    registry.register(
        Tool::new("generate_comprehensive_report", "ALM 종합 리포트 생성 (섹션별 데이터 통합)", Box::new(generate_comprehensive_report))
            .with_schema(ToolInputSchema::new(vec![
                field("include_sections", FieldType::Str, "포함할 섹션 (쉼표 구분: data_overview,liquidity_gap,market_data,dimensional_analysis)")
                    .optional(),
                field("scenario_no", FieldType::Int, "유동성 갭 분석에 사용할 시나리오 번호").optional(),
            ])),
    );

    registry.register(
        Tool::new("export_report", "리포트를 파일로 내보내기 (형식 선택 가능)", Box::new(export_report)).with_schema(ToolInputSchema::new(vec![
            field("format", FieldType::Str, "'pdf', 'excel', 'markdown', 'all' 중 하나").optional(),
            field("output_dir", FieldType::Str, "저장 디렉토리").optional(),
        ])),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        register_all(&mut r);
        r
    }

    #[test]
    fn registers_exactly_eleven_tools() {
        assert_eq!(registry().len(), 11);
    }

    #[test]
    fn export_before_report_fails_cleanly() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke("export_report", &serde_json::json!({ "format": "markdown" }), &mut scratch);
        assert!(out.starts_with("오류"));
    }

    #[test]
    fn report_then_export_succeeds() {
        let r = registry();
        let mut scratch = Scratch::new();
        let report_out = r.invoke("generate_comprehensive_report", &serde_json::json!({}), &mut scratch);
        assert!(!report_out.starts_with("오류"));
        let export_out = r.invoke("export_report", &serde_json::json!({ "format": "markdown" }), &mut scratch);
        assert!(!export_out.starts_with("오류"));
    }

    #[test]
    fn export_does_not_see_a_report_from_a_different_turn() {
        let r = registry();
        let mut turn_one = Scratch::new();
        let report_out = r.invoke("generate_comprehensive_report", &serde_json::json!({}), &mut turn_one);
        assert!(!report_out.starts_with("오류"));

        let mut turn_two = Scratch::new();
        let export_out = r.invoke("export_report", &serde_json::json!({ "format": "markdown" }), &mut turn_two);
        assert!(export_out.starts_with("오류"), "a fresh turn's scratch must not see an earlier turn's report");
    }

    #[test]
    fn unknown_tool_name_never_panics() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke("nonexistent_tool", &serde_json::json!({}), &mut scratch);
        assert!(out.starts_with("오류"));
    }

    #[test]
    fn missing_required_field_is_reported_as_error_string() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke("get_exchange_rate", &serde_json::json!({ "from_currency": "USD" }), &mut scratch);
        assert!(out.starts_with("오류"));
    }

    #[test]
    fn search_parses_a_json_string_filter_not_a_nested_object() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke("search_alm_contracts", &serde_json::json!({ "filters_json": "{\"CURRENCY_CD\":\"USD\"}" }), &mut scratch);
        assert!(!out.starts_with("오류"));
        assert!(out.contains("CURRENCY_CD=USD"));
    }

    #[test]
    fn search_rejects_a_filter_that_is_not_a_json_object_string() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke("search_alm_contracts", &serde_json::json!({ "filters_json": "not json" }), &mut scratch);
        assert!(out.starts_with("오류"));
    }

    #[test]
    fn compare_scenarios_parses_a_comma_separated_string() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke("compare_scenarios", &serde_json::json!({ "scenario_numbers": "1, 2, 3" }), &mut scratch);
        assert!(!out.starts_with("오류"));
        assert!(out.contains("총 3개 시나리오 비교"));
    }

    #[test]
    fn position_dimensions_parses_a_comma_separated_string() {
        let r = registry();
        let mut scratch = Scratch::new();
        let out = r.invoke(
            "analyze_new_position_growth",
            &serde_json::json!({ "current_base_date": "2020-06-30", "dimensions": "DIM_PROD, DIM_ORG" }),
            &mut scratch,
        );
        assert!(!out.starts_with("오류"));
        assert!(out.contains("DIM_PROD, DIM_ORG"));
    }
}
