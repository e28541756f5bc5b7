use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
/// All rostering, cron triggers and date comparisons run in this zone.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kuala_Lumpur";

const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key used to validate bearer tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Whether to start the cron scheduler (disable for one-off tooling)
    #[serde(default = "default_true_bool")]
    pub scheduler_enabled: bool,

    /// IANA timezone for scheduling and calendar-date comparisons
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// OpenAI API key for receipt OCR; claims degrade to manual approval
    /// when unset
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Driver-attendance upstream (AA Alive) base URL and key
    #[serde(default)]
    pub aaalive_api_url: Option<String>,
    #[serde(default)]
    pub aaalive_api_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_true_bool() -> bool {
    true
}
fn default_db_max_connections() -> u32 {
    20
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Parsed scheduling timezone. Falls back to Kuala Lumpur when the
    /// configured name is not a valid IANA zone.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Asia::Kuala_Lumpur)
    }
}

/// Loads configuration from `config/{default,<env>}.toml` layered with
/// `APP__`-prefixed environment variables. Bare `DATABASE_URL` and
/// `JWT_SECRET` are honoured for container deployments.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", environment.clone())?
        .set_default("database_url", "sqlite::memory:")?;

    let default_path = Path::new(CONFIG_DIR).join("default.toml");
    if default_path.exists() {
        builder = builder.add_source(File::from(default_path));
    }
    let env_path = Path::new(CONFIG_DIR).join(format!("{}.toml", environment));
    if env_path.exists() {
        builder = builder.add_source(File::from(env_path));
    }

    builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

    // Plain env names used by deployment tooling take highest precedence.
    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database_url", url)?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        builder = builder.set_override("jwt_secret", secret)?;
    } else if environment == DEFAULT_ENV {
        builder = builder.set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?;
    }
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        builder = builder.set_override("openai_api_key", key)?;
    }
    if let Ok(url) = env::var("AAALIVE_API_URL") {
        builder = builder.set_override("aaalive_api_url", url)?;
    }
    if let Ok(key) = env::var("AAALIVE_API_KEY") {
        builder = builder.set_override("aaalive_api_key", key)?;
    }

    let cfg: AppConfig = builder.build()?.try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

    info!(
        environment = %cfg.environment,
        timezone = %cfg.timezone,
        "configuration loaded"
    );

    Ok(cfg)
}

/// Initialises the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kerani_api={level},tower_http=info")));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
