use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment, File};
use paje::providers::configs::{
    AnthropicProviderConfig, ANTHROPIC_HOST, ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS,
};
use serde::Deserialize;
use std::fmt;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Settings file looked up in the working directory
pub const CONFIG_FILE: &str = "paje";

/// Read when no credential is configured under the PAJE_ prefix
pub const FALLBACK_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

#[derive(Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_anthropic_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ProviderSettings {
    /// The provider config, or None when no credential is set
    pub fn to_config(&self) -> Option<AnthropicProviderConfig> {
        let api_key = self.api_key.clone()?;
        Some(AnthropicProviderConfig {
            host: self.host.clone(),
            api_key,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        })
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentSettings {
    #[serde(default = "default_document_path")]
    pub path: PathBuf,
    /// Replacement persona template
    #[serde(default)]
    pub persona_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub document: DocumentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_file(CONFIG_FILE)
    }

    /// Load settings layering `config_file` between the defaults and the environment.
    ///
    /// The file is optional; its format follows the extension, `paje` alone probes
    /// the supported ones.
    pub fn with_config_file(config_file: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::load_and_validate(config_file)?;
        if settings.provider.api_key.is_none() {
            settings.provider.api_key = std::env::var(FALLBACK_API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        Ok(settings)
    }

    fn load_and_validate(config_file: &str) -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("server.typing_delay_ms", default_typing_delay_ms())?
            // Provider defaults
            .set_default("provider.host", default_anthropic_host())?
            .set_default("provider.model", default_model())?
            .set_default("provider.max_tokens", default_max_tokens())?
            // Document defaults
            .set_default("document.path", "documento.pdf")?
            // Optional settings file
            .add_source(File::with_name(config_file).required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("PAJE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// The provider credential, required before any chat request is served
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.provider
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar {
                env_var: to_env_var("provider.api_key"),
            })
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_typing_delay_ms() -> u64 {
    50
}

fn default_model() -> String {
    ANTHROPIC_MODEL.to_string()
}

fn default_anthropic_host() -> String {
    ANTHROPIC_HOST.to_string()
}

fn default_max_tokens() -> i32 {
    DEFAULT_MAX_TOKENS
}

fn default_document_path() -> PathBuf {
    PathBuf::from("documento.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("PAJE_") {
                env::remove_var(&key);
            }
        }
        env::remove_var(FALLBACK_API_KEY_VAR);
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.typing_delay(), Duration::from_millis(50));
        assert_eq!(settings.provider.host, "https://api.anthropic.com");
        assert_eq!(settings.provider.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.provider.max_tokens, 1000);
        assert_eq!(settings.provider.temperature, None);
        assert_eq!(settings.document.path, PathBuf::from("documento.pdf"));
        assert_eq!(settings.document.persona_path, None);

        // A missing credential is not a startup failure
        assert!(settings.provider.to_config().is_none());
        match settings.require_api_key() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "PAJE_PROVIDER__API_KEY")
            }
            other => panic!("Expected missing api key, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("PAJE_SERVER__PORT", "8080");
        env::set_var("PAJE_SERVER__TYPING_DELAY_MS", "0");
        env::set_var("PAJE_PROVIDER__API_KEY", "test-key");
        env::set_var("PAJE_PROVIDER__HOST", "http://localhost:9999");
        env::set_var("PAJE_PROVIDER__MODEL", "claude-3-5-haiku-latest");
        env::set_var("PAJE_PROVIDER__TEMPERATURE", "0.2");
        env::set_var("PAJE_DOCUMENT__PATH", "/srv/saberes.pdf");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.typing_delay(), Duration::ZERO);
        assert_eq!(settings.document.path, PathBuf::from("/srv/saberes.pdf"));
        assert_eq!(settings.require_api_key().unwrap(), "test-key");

        let config = settings.provider.to_config().unwrap();
        assert_eq!(config.host, "http://localhost:9999");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_tokens, Some(1000));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_fallback_api_key() {
        clean_env();
        env::set_var(FALLBACK_API_KEY_VAR, "sk-ant-fallback");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.require_api_key().unwrap(), "sk-ant-fallback");

        env::set_var("PAJE_PROVIDER__API_KEY", "sk-ant-prefixed");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.require_api_key().unwrap(), "sk-ant-prefixed");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_invalid_value_is_config_error() {
        clean_env();
        env::set_var("PAJE_SERVER__PORT", "not-a-port");

        let result = Settings::new();
        assert!(matches!(result, Err(ConfigError::Other(_))));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_debug_hides_api_key() {
        clean_env();
        env::set_var("PAJE_PROVIDER__API_KEY", "sk-ant-very-secret");

        let settings = Settings::new().unwrap();
        assert!(!format!("{:?}", settings).contains("sk-ant-very-secret"));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_config_file_sits_between_defaults_and_environment() {
        clean_env();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paje.toml");
        std::fs::write(
            &file,
            "[server]\nport = 4000\n\n[document]\npath = \"/srv/saberes.txt\"\n",
        )
        .unwrap();
        let file = file.to_str().unwrap();

        let settings = Settings::with_config_file(file).unwrap();
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.document.path, PathBuf::from("/srv/saberes.txt"));

        env::set_var("PAJE_SERVER__PORT", "5000");
        let settings = Settings::with_config_file(file).unwrap();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.document.path, PathBuf::from("/srv/saberes.txt"));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_config_file_is_ignored() {
        clean_env();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ausente.toml");

        let settings = Settings::with_config_file(file.to_str().unwrap()).unwrap();
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            typing_delay_ms: 50,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }
}
