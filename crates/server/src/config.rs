//! Server configuration from command-line arguments and environment.

use std::time::Duration;

use clap::Parser;
use sectio_core::FetchConfig;

/// Serve wiki articles as mobile-sections JSON
#[derive(Parser, Debug, Clone)]
#[command(name = "sectio-server")]
#[command(version)]
#[command(about = "Serve wiki articles as mobile-sections JSON", long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "SECTIO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SECTIO_PORT", default_value = "6927")]
    pub port: u16,

    /// Upstream HTTP timeout in seconds; requests are cut off slightly later
    #[arg(long, env = "SECTIO_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// User-Agent sent upstream
    #[arg(long, env = "SECTIO_USER_AGENT")]
    pub user_agent: Option<String>,

    /// REST base URL template, `{domain}` is substituted
    #[arg(long, env = "SECTIO_REST_TEMPLATE")]
    pub rest_template: Option<String>,

    /// Action API URL template, `{domain}` is substituted
    #[arg(long, env = "SECTIO_API_TEMPLATE")]
    pub api_template: Option<String>,

    /// Emit JSON log lines
    #[arg(long, env = "SECTIO_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whole-request deadline: the upstream timeout plus slack for processing.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout + 5)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig { timeout: self.timeout, ..Default::default() };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(template) = &self.rest_template {
            config.rest_template = template.clone();
        }
        if let Some(template) = &self.api_template {
            config.api_template = template.clone();
        }
        config
    }
}
