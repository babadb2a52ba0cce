//! Configuration module for the Cheap Eats backend.
//!
//! All configuration is loaded from environment variables once at startup.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Outbound mail settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP host; when absent mail is only logged
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox used for every outgoing message
    pub from: String,
    pub starttls: bool,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (optional in development)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Root directory holding the `email/` templates
    pub template_dir: PathBuf,
    /// Public base URL used to build links in emails
    pub public_url: String,
    pub mail: MailConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("CHEAPEATS_API_PSK").ok();

        let db_path = env::var("CHEAPEATS_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let index_path = env::var("CHEAPEATS_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("CHEAPEATS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:7777".to_string())
            .parse()
            .expect("Invalid CHEAPEATS_BIND_ADDR format");

        let log_level = env::var("CHEAPEATS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let template_dir = env::var("CHEAPEATS_TEMPLATE_DIR")
            .unwrap_or_else(|_| "./templates".to_string())
            .into();

        let public_url = env::var("CHEAPEATS_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:7777".to_string())
            .trim_end_matches('/')
            .to_string();

        let mail = MailConfig {
            host: env::var("MAIL_HOST").ok().filter(|h| !h.trim().is_empty()),
            port: env::var("MAIL_PORT")
                .unwrap_or_else(|_| "2525".to_string())
                .parse()
                .expect("Invalid MAIL_PORT format"),
            user: env::var("MAIL_USER").ok(),
            password: env::var("MAIL_PASS").ok(),
            from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Cheap Eats! <noreply@cheapeats.dev>".to_string()),
            starttls: env::var("MAIL_STARTTLS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            template_dir,
            public_url,
            mail,
        }
    }
}
