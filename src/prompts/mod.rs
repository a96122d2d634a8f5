//! Role prompts externalized to data files (Design Notes
//! "externalize prompts to locale-keyed data"), loaded at compile time via
//! `include_str!` and exposed by role.

use crate::agent::SpecialistRole;

pub const SYSTEM_PROMPT: &str = include_str!("system.txt");
pub const SUPERVISOR_PROMPT: &str = include_str!("supervisor.txt");
pub const COMBINER_PROMPT: &str = include_str!("combiner.txt");

const SEARCH_AGENT_PROMPT: &str = include_str!("search_agent.txt");
const MARKET_AGENT_PROMPT: &str = include_str!("market_agent.txt");
const ANALYSIS_AGENT_PROMPT: &str = include_str!("analysis_agent.txt");
const POSITION_AGENT_PROMPT: &str = include_str!("position_agent.txt");
const REPORT_AGENT_PROMPT: &str = include_str!("report_agent.txt");
const EXPORT_AGENT_PROMPT: &str = include_str!("export_agent.txt");

/// The system prompt for a given specialist role.
pub fn role_prompt(role: SpecialistRole) -> &'static str {
    match role {
        SpecialistRole::Search => SEARCH_AGENT_PROMPT,
        SpecialistRole::Market => MARKET_AGENT_PROMPT,
        SpecialistRole::Analysis => ANALYSIS_AGENT_PROMPT,
        SpecialistRole::Position => POSITION_AGENT_PROMPT,
        SpecialistRole::Report => REPORT_AGENT_PROMPT,
        SpecialistRole::Export => EXPORT_AGENT_PROMPT,
    }
}
