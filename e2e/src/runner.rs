//! Runs the registered cases against the spawned proxies
//!
//! Cases run one at a time because they share one mock upstream. The report
//! groups results by the category prefix of the case name (`basic/`,
//! `errors/`) and counts how many generateContent calls each case caused, so
//! an early-exit branch that reached the upstream shows up even when its
//! assertions did not check for it.

use colored::Colorize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crate::backend;
use crate::types::{SharedUpstreamState, TestResult};

pub type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A single registered case
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    pub run: Box<dyn Fn(TestContext) -> TestFuture + Send + Sync>,
}

impl TestCase {
    /// `errors/missing_prompt` -> `errors`
    fn category(&self) -> &'static str {
        self.name.split_once('/').map_or(self.name, |(c, _)| c)
    }
}

/// Handles every case gets
#[derive(Clone)]
pub struct TestContext {
    /// Proxy started with an API key
    pub proxy_addr: String,
    /// Proxy started without an API key
    pub keyless_proxy_addr: String,
    pub upstream_state: SharedUpstreamState,
    pub http_client: reqwest::Client,
}

pub async fn run_tests(cases: Vec<TestCase>, ctx: TestContext, filter: Option<&str>) -> Vec<TestResult> {
    let selected: Vec<&TestCase> = cases
        .iter()
        .filter(|c| filter.map_or(true, |f| c.name.contains(f)))
        .collect();

    println!("{} {} (key) / {} (no key), {} case(s)\n",
        "prompt-proxy e2e:".bright_white().bold(),
        ctx.proxy_addr.bright_cyan(),
        ctx.keyless_proxy_addr.bright_cyan(),
        selected.len(),
    );

    let mut results = Vec::with_capacity(selected.len());
    for case in selected {
        backend::reset(&ctx.upstream_state);

        let start = Instant::now();
        let outcome = (case.run)(ctx.clone()).await;
        let result = TestResult {
            name: case.name.to_string(),
            category: case.category(),
            passed: outcome.is_ok(),
            error: outcome.err().map(|e| format!("{:#}", e)),
            duration_ms: start.elapsed().as_millis() as u64,
            upstream_calls: backend::call_count(&ctx.upstream_state),
        };

        let verdict = if result.passed { "ok".bright_green() } else { "FAILED".bright_red().bold() };
        println!(
            "  {:<34} {:>6} {:>5}ms  upstream x{}",
            result.name, verdict, result.duration_ms, result.upstream_calls
        );
        results.push(result);
    }

    print_summary(&results);
    results
}

/// `(passed, total)` per category
fn category_counts(results: &[TestResult]) -> BTreeMap<&'static str, (usize, usize)> {
    let mut by_category: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
    for r in results {
        let entry = by_category.entry(r.category).or_default();
        entry.1 += 1;
        if r.passed {
            entry.0 += 1;
        }
    }
    by_category
}

/// Per-category pass counts, then each failure with its error chain
fn print_summary(results: &[TestResult]) {
    println!();
    for (category, (passed, total)) in &category_counts(results) {
        let line = format!("  {category}: {passed}/{total}");
        if passed == total {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }

    let failures: Vec<&TestResult> = results.iter().filter(|r| !r.passed).collect();
    if failures.is_empty() {
        println!("\n{}\n", "All cases passed".bright_green().bold());
        return;
    }

    println!("\n{}", format!("{} case(s) failed:", failures.len()).bright_red().bold());
    for r in failures {
        println!("  {} {}", r.name.bright_white(), r.error.as_deref().unwrap_or_default());
    }
    println!();
}

pub fn list_tests(cases: &[TestCase]) {
    let mut current = "";
    for case in cases {
        if case.category() != current {
            current = case.category();
            println!("\n{}", current.bright_white().bold());
        }
        println!("  {:<34} {}", case.name.bright_cyan(), case.description);
    }
    println!();
}
