//! Stats formatting for different output formats

use super::RequestMetrics;
use crate::config::StatsFormat;

/// Format metrics according to the configured format
pub fn format_metrics(metrics: &RequestMetrics, format: StatsFormat) -> String {
    match format {
        StatsFormat::Pretty => format_pretty(metrics),
        StatsFormat::Json => format_json(metrics),
        StatsFormat::Compact => format_compact(metrics),
    }
}

fn upstream_str(m: &RequestMetrics) -> String {
    match (m.upstream_status, m.upstream_ms) {
        (Some(status), Some(ms)) => format!("{} in {:.1}ms", status, ms),
        (Some(status), None) => status.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Pretty box format for terminal output
fn format_pretty(m: &RequestMetrics) -> String {
    format!(
        r#"┌──────────────────────────────────────────────────────────────────┐
│ Prompt Proxy Request                                             │
├──────────────────────────────────────────────────────────────────┤
│ Model:    {:54}│
│ Time:     {:54}│
│ Request:  {:54}│
├──────────────────────────────────────────────────────────────────┤
│ Outcome:  {:54}│
│ Status:   {:<54}│
│ Upstream: {:54}│
│ Chars:    {:54}│
│ Duration: {:52.1}ms│
└──────────────────────────────────────────────────────────────────┘
"#,
        truncate(&m.model, 54),
        m.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        m.request_id,
        m.outcome.as_str(),
        m.status,
        upstream_str(m),
        format!("{} in / {} out", m.prompt_chars, m.response_chars),
        m.duration_ms,
    )
}

/// JSON format for structured logging
fn format_json(m: &RequestMetrics) -> String {
    serde_json::to_string(m).unwrap_or_else(|_| "{}".to_string())
}

/// Compact single-line format
fn format_compact(m: &RequestMetrics) -> String {
    format!(
        "[{}] model={} status={} outcome={} upstream={} chars={}/{} dur={:.1}ms",
        m.timestamp.format("%H:%M:%S"),
        m.model,
        m.status,
        m.outcome.as_str(),
        upstream_str(m),
        m.prompt_chars,
        m.response_chars,
        m.duration_ms
    )
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
