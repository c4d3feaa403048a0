use anyhow::Context;
use serde::{Deserialize, Serialize};
use sessionlink_core::{CodecConfig, EncodingKind};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Log codec inputs and outputs for every request
    #[serde(default = "default_false")]
    pub log_requests: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            logging: LoggingConfig::default(),
            codec: CodecConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_requests: false,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        // Server settings
        if let Ok(val) = std::env::var("SESSIONLINK_HOST") {
            self.host = val;
        }

        if let Ok(val) = std::env::var("SESSIONLINK_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => eprintln!(
                    "Warning: Invalid SESSIONLINK_PORT '{}', keeping {}",
                    val, self.port
                ),
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("SESSIONLINK_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("SESSIONLINK_LOG_FORMAT") {
            match val.to_lowercase().as_str() {
                "text" => self.logging.format = LogFormat::Text,
                "json" => self.logging.format = LogFormat::Json,
                _ => eprintln!("Warning: Invalid SESSIONLINK_LOG_FORMAT '{}', using default", val),
            }
        }

        if let Ok(val) = std::env::var("SESSIONLINK_LOG_REQUESTS")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.logging.log_requests = enabled;
        }

        // Codec settings
        if let Ok(val) = std::env::var("SESSIONLINK_BASE_URL") {
            self.codec.base_url = val;
        }

        if let Ok(val) = std::env::var("SESSIONLINK_SESSION_PARAM") {
            self.codec.session_param = val;
        }

        if let Ok(val) = std::env::var("SESSIONLINK_ENCODING") {
            match val.parse::<EncodingKind>() {
                Ok(kind) => self.codec.encoding = kind,
                Err(e) => eprintln!("Warning: {}, using default", e),
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    sessionlink_ingress::session::DEFAULT_MAX_BODY_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
