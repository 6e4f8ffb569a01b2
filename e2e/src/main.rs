//! prompt-proxy e2e test runner
//!
//! Default (no args): finds the proxy binary, spawns it twice (with and
//! without an API key) against a mock upstream, runs all tests, kills both.
//!
//!   cargo run                          # auto-detect proxy binary, run all tests
//!   cargo run -- list                  # list all tests
//!   cargo run -- spawn-and-run [opts]  # explicit paths / ports

mod backend;
mod client;
mod runner;
mod tests;
mod types;

use clap::{Parser, Subcommand};
use colored::Colorize;
use runner::{list_tests, run_tests, TestContext};
use tests::all_tests;

/// Default proxy binary candidates, tried in order
const DEFAULT_PROXY_BINS: &[&str] = &["../target/release/prompt-proxy", "../target/debug/prompt-proxy"];

const DEFAULT_PROXY_CONFIG: &str = "test_configs/proxy.yaml";
const DEFAULT_UPSTREAM_PORT: u16 = 18080;
const DEFAULT_PROXY_PORT: u16 = 18888;
const DEFAULT_KEYLESS_PROXY_PORT: u16 = 18889;

/// Must match upstream.api_key_env in the test config
const API_KEY_ENV: &str = "E2E_GEMINI_API_KEY";
const API_KEY: &str = "e2e-secret";

#[derive(Parser)]
#[command(
    name = "e2e",
    about = "End-to-end tests for prompt-proxy",
    long_about = "Runs all e2e tests by default (no arguments needed).\n\
                  Spawns the proxy binary automatically, runs tests, then kills it."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Only run tests whose name contains this string (applies to default run)
    #[arg(long, short, global = true)]
    filter: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List all available tests
    List,

    /// Spawn the proxy binary, run all tests, then kill it
    SpawnAndRun {
        /// Path to the prompt-proxy binary
        #[arg(long)]
        proxy_bin: Option<String>,

        /// Path to the proxy config YAML (upstream must point at mock upstream port)
        #[arg(long, default_value = DEFAULT_PROXY_CONFIG)]
        proxy_config: String,

        /// Port for the mock upstream - must match config
        #[arg(long, default_value_t = DEFAULT_UPSTREAM_PORT)]
        upstream_port: u16,

        /// Proxy listen port - must match config
        #[arg(long, default_value_t = DEFAULT_PROXY_PORT)]
        proxy_port: u16,

        /// Listen port for the second, keyless proxy
        #[arg(long, default_value_t = DEFAULT_KEYLESS_PROXY_PORT)]
        keyless_proxy_port: u16,
    },
}

/// Where and how to spawn the proxies
struct SpawnPlan {
    proxy_bin: String,
    proxy_config: String,
    upstream_port: u16,
    proxy_port: u16,
    keyless_proxy_port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let plan = SpawnPlan {
                proxy_bin: find_proxy_bin()?,
                proxy_config: DEFAULT_PROXY_CONFIG.to_string(),
                upstream_port: DEFAULT_UPSTREAM_PORT,
                proxy_port: DEFAULT_PROXY_PORT,
                keyless_proxy_port: DEFAULT_KEYLESS_PROXY_PORT,
            };
            do_spawn_and_run(plan, cli.filter).await?;
        }

        Some(Command::List) => {
            list_tests(&all_tests());
        }

        Some(Command::SpawnAndRun {
            proxy_bin,
            proxy_config,
            upstream_port,
            proxy_port,
            keyless_proxy_port,
        }) => {
            let proxy_bin = match proxy_bin {
                Some(p) => p,
                None => find_proxy_bin()?,
            };
            let plan = SpawnPlan {
                proxy_bin,
                proxy_config,
                upstream_port,
                proxy_port,
                keyless_proxy_port,
            };
            do_spawn_and_run(plan, cli.filter).await?;
        }
    }

    Ok(())
}

async fn do_spawn_and_run(plan: SpawnPlan, filter: Option<String>) -> anyhow::Result<()> {
    println!("Starting mock upstream on port {}...", plan.upstream_port);
    let upstream_state = backend::start(plan.upstream_port).await?;
    println!("Mock upstream running on 127.0.0.1:{}", plan.upstream_port);

    let mut proxy = spawn_proxy(&plan, plan.proxy_port, Some(API_KEY))?;
    let mut keyless_proxy = spawn_proxy(&plan, plan.keyless_proxy_port, None)?;

    let proxy_addr = format!("127.0.0.1:{}", plan.proxy_port);
    let keyless_proxy_addr = format!("127.0.0.1:{}", plan.keyless_proxy_port);
    println!("Waiting for proxies at {} and {}...", proxy_addr, keyless_proxy_addr);
    wait_for_proxy(&proxy_addr).await?;
    wait_for_proxy(&keyless_proxy_addr).await?;
    println!("Proxies are ready!\n");

    let ctx = TestContext {
        proxy_addr,
        keyless_proxy_addr,
        upstream_state,
        http_client: client::build_client(),
    };

    let results = run_tests(all_tests(), ctx, filter.as_deref()).await;

    proxy.kill().await.ok();
    keyless_proxy.kill().await.ok();

    exit_on_failure(&results);
    Ok(())
}

fn spawn_proxy(plan: &SpawnPlan, port: u16, api_key: Option<&str>) -> anyhow::Result<tokio::process::Child> {
    println!(
        "Spawning proxy: {} run --config {} --port {} ({})",
        plan.proxy_bin,
        plan.proxy_config,
        port,
        if api_key.is_some() { "with key" } else { "without key" }
    );

    let mut command = tokio::process::Command::new(&plan.proxy_bin);
    command
        .arg("run")
        .arg("--config")
        .arg(&plan.proxy_config)
        .arg("--port")
        .arg(port.to_string())
        .arg("--upstream-url")
        .arg(format!("http://127.0.0.1:{}", plan.upstream_port))
        .kill_on_drop(true);

    match api_key {
        Some(key) => command.env(API_KEY_ENV, key),
        None => command.env_remove(API_KEY_ENV),
    };

    command
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to spawn '{}': {}", plan.proxy_bin, e))
}

/// Find the proxy binary, trying release then debug builds
fn find_proxy_bin() -> anyhow::Result<String> {
    for candidate in DEFAULT_PROXY_BINS {
        if std::path::Path::new(candidate).exists() {
            println!("Using proxy binary: {}", candidate.bright_cyan());
            return Ok(candidate.to_string());
        }
    }
    Err(anyhow::anyhow!(
        "No proxy binary found. Tried: {}\nBuild with: cd .. && cargo build --release",
        DEFAULT_PROXY_BINS.join(", ")
    ))
}

/// Exit with code 1 if any tests failed
fn exit_on_failure(results: &[crate::types::TestResult]) {
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }
}

/// Wait for the proxy to start accepting connections (retry with backoff)
async fn wait_for_proxy(addr: &str) -> anyhow::Result<()> {
    let client = client::build_client();
    let health_url = format!("http://{}/health", addr);

    for attempt in 0..30 {
        tokio::time::sleep(tokio::time::Duration::from_millis(200 + attempt * 100)).await;
        if client.get(&health_url).send().await.is_ok() {
            return Ok(());
        }
    }

    Err(anyhow::anyhow!(
        "Proxy did not start within timeout. Is the binary correct? Check: {}",
        addr
    ))
}
