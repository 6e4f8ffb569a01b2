//! Prompt logging formatter

/// Format a one-line summary of an incoming prompt
pub fn format_prompt_log(model: &str, prompt: &str) -> String {
    let normalized = normalize_whitespace(prompt);
    format!(
        "→ model={} chars={} \"{}\"",
        model,
        prompt.chars().count(),
        truncate_message(&normalized)
    )
}

/// Convert newlines and tabs to single spaces, collapse multiple spaces
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate message according to rules:
/// - If <= 100 chars: show all
/// - If > 100 chars: first 25 + " ... " + last 75
fn truncate_message(s: &str) -> String {
    const MAX_TOTAL: usize = 100;
    const PREFIX_LEN: usize = 25;
    const SUFFIX_LEN: usize = 75;
    const ELLIPSIS: &str = " ... ";

    let total = s.chars().count();
    if total <= MAX_TOTAL {
        return s.to_string();
    }

    // Counted in chars so multi-byte prompts never split inside a code point
    let prefix: String = s.chars().take(PREFIX_LEN).collect();
    let suffix: String = s.chars().skip(total - SUFFIX_LEN).collect();

    format!("{}{}{}", prefix, ELLIPSIS, suffix)
}
