use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

const DEFAULT_DB_FILE: &str = "marketing-audit.db";

#[derive(Parser, Debug, Clone)]
#[command(name = "audit-server")]
#[command(about = "Marketing audit pipeline HTTP server")]
#[command(version)]
pub struct ServerConfig {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// SQLite database file
    #[arg(long = "database", env = "DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Completion API key
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Completion API base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,

    /// Completion model name
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-3.5-turbo")]
    pub model: String,

    /// Timeout for outbound requests, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,
}

impl ServerConfig {
    /// Configured database path, or a file under the user data directory.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("marketing-audit")
                .join(DEFAULT_DB_FILE)
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
