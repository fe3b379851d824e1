//! System prompt for the reasoning oracle.

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an agent designed to answer queries over a set of given papers. \
Please always use the tools provided to answer a question. Do not rely on prior knowledge.";

/// The configured prompt, or the default when none is set or it is blank.
pub fn system_prompt(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
        .to_string()
}
