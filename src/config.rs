use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default = "default_token_expire_hours")]
    pub token_expire_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Request body cap for uploads, in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MailConfig {
    #[serde(default = "default_mail_host")]
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL used when building share links in notification mails.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// When false, POST /auth/register is rejected; admins create accounts.
    #[serde(default)]
    pub open_registration: bool,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "data/sharebox.db".to_string()
}

fn default_jwt_secret() -> String {
    "change-this-secret".to_string()
}

fn default_token_expire_hours() -> u64 {
    24
}

fn default_upload_dir() -> String {
    "data/uploads".to_string()
}

fn default_max_upload_size() -> usize {
    100 * 1024 * 1024 // 100MB
}

fn default_mail_host() -> String {
    "localhost".to_string()
}

fn default_mail_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "noreply@sharebox.local".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            token_expire_hours: default_token_expire_hours(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            open_registration: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            storage: StorageConfig::default(),
            mail: MailConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;
        Ok(config)
    }

    /// Load configuration from config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["config.toml", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: SB_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SB_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("SB_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }

        if let Ok(val) = env::var("SB_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        if let Ok(val) = env::var("SB_CONF_JWT_SECRET") {
            self.jwt.secret = val;
        }
        if let Ok(val) = env::var("SB_CONF_JWT_EXPIRE_HOURS") {
            if let Ok(hours) = val.parse() {
                self.jwt.token_expire_hours = hours;
            }
        }

        if let Ok(val) = env::var("SB_CONF_STORAGE_UPLOAD_DIR") {
            self.storage.upload_dir = val;
        }
        if let Ok(val) = env::var("SB_CONF_STORAGE_MAX_UPLOAD_SIZE") {
            if let Ok(size) = val.parse() {
                self.storage.max_upload_size = size;
            }
        }

        if let Ok(val) = env::var("SB_CONF_MAIL_HOST") {
            self.mail.host = val;
        }
        if let Ok(val) = env::var("SB_CONF_MAIL_PORT") {
            if let Ok(port) = val.parse() {
                self.mail.port = port;
            }
        }
        if let Ok(val) = env::var("SB_CONF_MAIL_USERNAME") {
            if !val.is_empty() {
                self.mail.username = Some(val);
            }
        }
        if let Ok(val) = env::var("SB_CONF_MAIL_PASSWORD") {
            if !val.is_empty() {
                self.mail.password = Some(val);
            }
        }
        if let Ok(val) = env::var("SB_CONF_MAIL_FROM") {
            self.mail.from = val;
        }

        if let Ok(val) = env::var("SB_CONF_APP_PUBLIC_BASE_URL") {
            self.app.public_base_url = val;
        }
        if let Ok(val) = env::var("SB_CONF_APP_OPEN_REGISTRATION") {
            if let Ok(v) = val.parse() {
                self.app.open_registration = v;
            }
        }
    }

    /// Ensure JWT secret is not the shipped default; generate and persist one
    /// next to the database if it is.
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if self.jwt.secret == default_jwt_secret() || self.jwt.secret.is_empty() {
            let data_dir = Path::new(&self.database.path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| "data".into());
            let secret_path = data_dir.join(".jwt_secret");

            if secret_path.exists() {
                let secret = fs::read_to_string(&secret_path)?;
                self.jwt.secret = secret.trim().to_string();
                tracing::info!("Loaded persisted JWT secret from {}", secret_path.display());
            } else {
                let secret = uuid::Uuid::new_v4().to_string();
                fs::create_dir_all(&data_dir)?;
                fs::write(&secret_path, &secret)?;
                self.jwt.secret = secret;
                tracing::info!("Generated and persisted new JWT secret to {}", secret_path.display());
            }
        }
        Ok(())
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.storage.upload_dir)?;
        Ok(())
    }
}
