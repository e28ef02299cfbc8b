use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory for the append-only request/error log files.
    pub log_dir: String,

    /// Environment name. Selects which frontend base URL is embedded in
    /// password-reset links ("development" or "production").
    pub environment: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/notedesk.db".to_string(),
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            environment: "development".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3500,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens. Overridden by the
    /// NOTEDESK_SESSION_SECRET environment variable; the default only
    /// exists so local development works out of the box.
    pub session_secret: String,

    /// Session token validity window in days. Tokens are single-shot:
    /// there is no refresh, re-authentication requires a fresh login.
    pub token_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: "dev-secret-change-me".to_string(),
            token_ttl_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When false, outgoing mail is recorded in memory instead of being
    /// handed to the relay. Useful for development and tests.
    pub enabled: bool,

    /// HTTP mail relay endpoint (JSON POST).
    pub relay_url: String,

    /// Relay API key. Overridden by NOTEDESK_MAIL_API_KEY.
    pub api_key: String,

    pub from_address: String,

    /// Frontend base URL embedded in reset links when environment is
    /// "development".
    pub frontend_url_dev: String,

    /// Frontend base URL embedded in reset links otherwise.
    pub frontend_url_prod: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            relay_url: "http://localhost:8025/api/send".to_string(),
            api_key: String::new(),
            from_address: "noreply@notedesk.local".to_string(),
            frontend_url_dev: "http://localhost:3000".to_string(),
            frontend_url_prod: "https://notedesk.example.com".to_string(),
        }
    }
}

impl MailConfig {
    /// Base URL for links embedded in outgoing mail, selected by
    /// environment name.
    #[must_use]
    pub fn frontend_url(&self, environment: &str) -> &str {
        if environment == "production" {
            &self.frontend_url_prod
        } else {
            &self.frontend_url_dev
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Login endpoint throttling policy.
    pub auth_throttle: AuthThrottleConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auth_throttle: AuthThrottleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthThrottleConfig {
    /// Max login attempts per client in the window before rejection.
    pub max_attempts: u32,

    /// Rolling window for counting attempts.
    pub window_seconds: u64,
}

impl Default for AuthThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = PathBuf::from("config.toml");

        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(&path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and deployment-specific values come from the environment so
    /// they never land in a checked-in config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("NOTEDESK_SESSION_SECRET") {
            self.auth.session_secret = secret;
        }
        if let Ok(url) = std::env::var("NOTEDESK_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(key) = std::env::var("NOTEDESK_MAIL_API_KEY") {
            self.mail.api_key = key;
        }
        if let Ok(env_name) = std::env::var("NOTEDESK_ENV") {
            self.general.environment = env_name;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.session_secret.is_empty() {
            anyhow::bail!("Session secret cannot be empty");
        }

        if self.auth.token_ttl_days <= 0 {
            anyhow::bail!("Token TTL must be at least one day");
        }

        if self.mail.enabled && self.mail.relay_url.is_empty() {
            anyhow::bail!("Mail relay URL cannot be empty when mail is enabled");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            mail: MailConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}
