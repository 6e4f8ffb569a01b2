//! prompt-proxy: serverless-style proxy for the Gemini generateContent API
//!
//! Accepts `{"prompt": "..."}` over POST, calls the upstream with a
//! server-side API key and answers with `{"text": "..."}`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use prompt_proxy::{
    config::AppConfig,
    proxy::{build_proxy, FUNCTION_PATH},
    run_server, IncomingRequest,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log line encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line, for log shippers
    Json,
}

#[derive(Parser)]
#[command(name = "prompt-proxy")]
#[command(version = "0.1.0")]
#[command(about = "Serverless-style proxy for the Gemini generateContent API")]
#[command(long_about = "
prompt-proxy forwards a prompt to Google's Generative Language API, adding
the API key server-side, and returns the generated text.

The API key is read from GEMINI_API_KEY (or the variable named by
upstream.api_key_env in the config file).

Example usage:
  prompt-proxy run --config config.yaml
  prompt-proxy prompt \"Write a haiku about proxies\"
")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Run {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override upstream base URL (e.g., "http://127.0.0.1:18080")
        #[arg(long)]
        upstream_url: Option<String>,
    },

    /// Validate configuration file
    CheckConfig,

    /// Run one prompt through the handler and print the response
    Prompt {
        /// Prompt text
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.log_format);

    match cli.command {
        Commands::Run { port, upstream_url } => {
            run_proxy(&cli.config, port, upstream_url).await?;
        }
        Commands::CheckConfig => {
            check_config(&cli.config);
        }
        Commands::Prompt { text } => {
            send_prompt(&cli.config, text).await?;
        }
    }

    Ok(())
}

/// `--log-level` wins over `RUST_LOG`, which falls back to `info`
fn level_filter(log_level: Option<LogLevel>) -> String {
    if let Some(level) = log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    }
}

fn init_tracing(log_level: Option<LogLevel>, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(level_filter(log_level));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .init(),
    }
}

/// Run the HTTP server
async fn run_proxy(
    config_path: &Path,
    port_override: Option<u16>,
    upstream_url_override: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_config_or_exit(config_path);

    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(url) = upstream_url_override {
        config.upstream.base_url = url;
    }
    config.validate()?;

    run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))
}

/// Validate configuration file
fn check_config(config_path: &Path) {
    match AppConfig::from_file(config_path) {
        Ok(config) => {
            println!("✓ Configuration file is valid\n");
            println!("Server:");
            println!("  Listen: {}:{}", config.server.host, config.server.port);
            println!("  Route:  {}", FUNCTION_PATH);
            println!("\nUpstream:");
            println!("  Endpoint: {}", config.upstream.endpoint());
            println!("  Model: {}", config.upstream.model);
            match config.upstream.timeout_seconds {
                Some(secs) => println!("  Timeout: {}s", secs),
                None => println!("  Timeout: none"),
            }
            let key_status = if config.upstream.resolve_api_key().is_some() {
                "found"
            } else {
                "MISSING"
            };
            println!("  API key ({}): {}", config.upstream.api_key_env, key_status);
            println!("\nStats:");
            println!("  Enabled: {}", config.stats.enabled);
            println!("  Format: {:?}", config.stats.format);
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run one invocation in-process
async fn send_prompt(config_path: &Path, text: String) -> anyhow::Result<()> {
    let config = load_config_or_exit(config_path);
    let proxy = build_proxy(&config)?;

    let body = serde_json::json!({ "prompt": text }).to_string();
    let response = proxy.handle(IncomingRequest::new("POST", body)).await;

    println!("Status: {}", response.status);
    for (name, value) in &response.headers {
        println!("{}: {}", name, value);
    }
    println!("\n{}", response.body);

    if response.status != 200 {
        std::process::exit(1);
    }
    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent, or exit with error
fn load_config_or_exit(config_path: &Path) -> AppConfig {
    let result = if config_path.exists() {
        tracing::info!("Loading configuration from {:?}", config_path);
        AppConfig::from_file(config_path)
    } else {
        tracing::warn!("{:?} not found, trying default locations", config_path);
        AppConfig::load_or_default(None)
    };

    match result {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!("\nYou can copy config.yaml.default and modify it:");
            eprintln!("  cp config.yaml.default config.yaml");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_defaults_to_text() {
        let cli = Cli::try_parse_from(["prompt-proxy", "check-config"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_log_format_json_is_global() {
        let cli = Cli::try_parse_from(["prompt-proxy", "check-config", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);

        let cli = Cli::try_parse_from(["prompt-proxy", "--log-format", "json", "run", "--port", "9000"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Run { port: Some(9000), .. }));
    }

    #[test]
    fn test_log_format_rejects_unknown() {
        assert!(Cli::try_parse_from(["prompt-proxy", "--log-format", "xml", "check-config"]).is_err());
    }

    #[test]
    fn test_json_subscriber_emits_json_lines() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buf(Arc<Mutex<Vec<u8>>>);

        impl Write for Buf {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = Buf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(model = "test-model", "Prompt forwarded");
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(line["fields"]["message"], "Prompt forwarded");
        assert_eq!(line["fields"]["model"], "test-model");
        assert_eq!(line["level"], "INFO");
    }
}
