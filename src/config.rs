use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub images: ImageConfig,

    pub listings: ListingConfig,

    pub notifications: NotificationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

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
            database_path: "sqlite:data/clozer.db".to_string(),
            log_level: "info".to_string(),
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

    /// Whether to set the Secure flag on the admin session cookie.
    pub secure_cookies: bool,

    /// Upper bound for a request body, multipart uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["*".to_string()],
            secure_cookies: false,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,

    pub access_token_minutes: i64,

    pub refresh_token_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "jwt-secret-string".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Directory holding `<usuario_id>/<anuncio_id>/imagem<n>.jpg`
    pub root: String,

    pub target_width: u32,

    pub jpeg_quality: u8,

    pub max_per_listing: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            root: "static/images".to_string(),
            target_width: 1024,
            jpeg_quality: 90,
            max_per_listing: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Maximum number of listings a single user may own.
    pub quota: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { quota: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub send_emails: bool,

    pub sender: String,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_username: String,

    pub smtp_password: String,

    /// Chat webhook receiving `{"text": ...}`. Empty disables it.
    pub webhook_url: String,

    pub request_timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            send_emails: false,
            sender: "atendimento@clozer.com.br".to_string(),
            smtp_host: "smtp.zoho.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            webhook_url: String::new(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            images: ImageConfig::default(),
            listings: ListingConfig::default(),
            notifications: NotificationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets may live in the environment (or a `.env` file) instead of the TOML file.
    pub fn apply_env_overrides(&mut self) {
        dotenvy::dotenv().ok();

        if let Ok(url) = std::env::var("CLOZER_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(secret) = std::env::var("CLOZER_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(password) = std::env::var("CLOZER_SMTP_PASSWORD") {
            self.notifications.smtp_password = password;
        }
        if let Ok(url) = std::env::var("CLOZER_WEBHOOK_URL") {
            self.notifications.webhook_url = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("clozer").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".clozer").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.images.target_width == 0 {
            anyhow::bail!("Image target width must be > 0");
        }

        if !(1..=100).contains(&self.images.jpeg_quality) {
            anyhow::bail!("JPEG quality must be between 1 and 100");
        }

        if self.listings.quota == 0 {
            anyhow::bail!("Listing quota must be > 0");
        }

        if !self.notifications.webhook_url.is_empty() {
            url::Url::parse(&self.notifications.webhook_url).context("Invalid webhook URL")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listings.quota, 500);
        assert_eq!(config.images.target_width, 1024);
        assert_eq!(config.images.jpeg_quality, 90);
        assert_eq!(config.images.root, "static/images");
        assert!(!config.notifications.send_emails);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[images]"));
        assert!(toml_str.contains("[notifications]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [listings]
            quota = 3
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.listings.quota, 3);

        assert_eq!(config.auth.access_token_minutes, 15);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.images.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.notifications.webhook_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.listings.quota = 0;
        assert!(config.validate().is_err());
    }
}
