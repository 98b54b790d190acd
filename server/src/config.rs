use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub uploads: UploadsConfig,
    pub submissions: SubmissionsConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Take the client address from `Forwarded`/`X-Forwarded-For`; only behind a trusted proxy
    pub trust_forwarded_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            trust_forwarded_headers: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: get_default_data_dir().join("surveys.db"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl_secs: 60 * 60,
            refresh_token_ttl_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl AuthConfig {
    /// Secret used to sign tokens; empty only if `load` was bypassed
    pub fn secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UploadsConfig {
    pub dir: PathBuf,
    /// Lowercase extensions without the dot
    pub allowed_extensions: Vec<String>,
    pub max_file_bytes: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: get_default_data_dir().join("uploads"),
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

/// How a repeat submission to the same survey is recognised
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Authenticated user id, falling back to the source address
    #[default]
    IdentityOrAddress,
    /// Only authenticated users are deduplicated
    IdentityOnly,
    Disabled,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SubmissionsConfig {
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl AppConfig {
    /// Loads `~/.config/survey-server/config.toml`, writing defaults on first run
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let default_config = toml::to_string_pretty(&AppConfig::default()).map_err(|e| {
                ConfigError::Message(format!("Failed to render default config: {e}"))
            })?;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
        }

        let mut config = Self::build(&config_path)?;

        if config.auth.jwt_secret.is_none() {
            let new_secret = generate_jwt_secret();
            tracing::info!("Generated new JWT secret for authentication");

            if let Err(e) = persist_jwt_secret(&config_path, &new_secret) {
                tracing::warn!("Failed to save JWT secret to config file: {e}");
                tracing::warn!("The JWT secret will be regenerated on next restart");
            }
            config.auth.jwt_secret = Some(new_secret);
        }

        Ok(config)
    }

    pub fn load_from_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::Message(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }

        let mut config = Self::build(config_path)?;

        if config.auth.jwt_secret.is_none() {
            tracing::warn!(
                "No jwt_secret in {}, using a generated one for this run",
                config_path.display()
            );
            config.auth.jwt_secret = Some(generate_jwt_secret());
        }

        Ok(config)
    }

    fn build(config_path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(
                Environment::with_prefix("SURVEY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = builder.try_deserialize()?;

        config.database.path = expand_tilde(&config.database.path);
        config.uploads.dir = expand_tilde(&config.uploads.dir);
        config.uploads.allowed_extensions = config
            .uploads
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        Ok(config)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = home::home_dir() {
            let path_str = path.to_string_lossy();
            let expanded = path_str.replacen('~', &home.to_string_lossy(), 1);
            return PathBuf::from(expanded);
        }
    }
    path.to_path_buf()
}

fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("survey-server/config.toml")
    } else {
        PathBuf::from("survey-server.toml")
    }
}

fn get_default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join("survey-server")
    } else {
        PathBuf::from("survey-data")
    }
}

/// Generates a cryptographically secure random JWT secret
/// Equivalent to `openssl rand -base64 48`
fn generate_jwt_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..48).map(|_| rng.random()).collect();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &random_bytes)
}

/// Writes `auth.jwt_secret` into an existing config file, keeping its other keys
fn persist_jwt_secret(config_path: &Path, jwt_secret: &str) -> Result<(), std::io::Error> {
    let content = std::fs::read_to_string(config_path)?;
    let mut table: toml::Table = toml::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let auth = table
        .entry("auth")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    if let toml::Value::Table(auth) = auth {
        auth.insert(
            "jwt_secret".to_string(),
            toml::Value::String(jwt_secret.to_string()),
        );
    }

    let updated = toml::to_string_pretty(&table)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(config_path, updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
port = 9100

[auth]
jwt_secret = "from-file"
"#,
        );

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.secret(), "from-file");
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(
            config.uploads.allowed_extensions,
            vec!["png", "jpg", "jpeg", "gif", "pdf"]
        );
        assert_eq!(
            config.submissions.duplicate_policy,
            DuplicatePolicy::IdentityOrAddress
        );
    }

    #[test]
    fn test_load_from_file_normalizes_extensions_and_policy() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[uploads]
allowed_extensions = [".PNG", "txt"]

[submissions]
duplicate_policy = "identity_only"
"#,
        );

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.uploads.allowed_extensions, vec!["png", "txt"]);
        assert_eq!(
            config.submissions.duplicate_policy,
            DuplicatePolicy::IdentityOnly
        );
        // Secret is generated when absent
        assert!(!config.auth.secret().is_empty());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = AppConfig::load_from_file(&dir.path().join("nope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde(Path::new("~/surveys.db"));
        if let Some(home) = home::home_dir() {
            assert_eq!(expanded, home.join("surveys.db"));
        }
        assert_eq!(
            expand_tilde(Path::new("/var/lib/surveys.db")),
            PathBuf::from("/var/lib/surveys.db")
        );
    }

    #[test]
    fn test_persist_jwt_secret_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[server]\nport = 9200\n");

        persist_jwt_secret(&path, "s3cret").unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.auth.secret(), "s3cret");
    }

    #[test]
    fn test_generated_secret_is_base64_of_48_bytes() {
        let secret = generate_jwt_secret();
        let decoded =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &secret).unwrap();
        assert_eq!(decoded.len(), 48);
    }
}
