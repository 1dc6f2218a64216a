use crate::services::serial_id::DEFAULT_MAX_SERIAL_ID;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for `max_serial_id`; controller tables are small
const SERIAL_ID_LIMIT: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Number of slots in the controller PIN table
    #[serde(default = "default_max_serial_id")]
    pub max_serial_id: usize,
    #[serde(default = "default_wal_path")]
    pub wal_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
    /// Notifications waiting for the webhook; beyond this they are dropped
    #[serde(default = "default_notify_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Console,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Console => write!(f, "console"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub console: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_serial_id: default_max_serial_id(),
            wal_path: default_wal_path(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            api_key: None,
            timeout_secs: default_notify_timeout(),
            queue_capacity: default_notify_queue_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: false,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_max_serial_id() -> usize {
    DEFAULT_MAX_SERIAL_ID
}

fn default_wal_path() -> PathBuf {
    PathBuf::from("registry.wal")
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_notify_queue_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if self.server.port == Some(0) {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.registry.max_serial_id == 0 || self.registry.max_serial_id > SERIAL_ID_LIMIT {
            bail!(
                "max_serial_id must be between 1 and {}, got {}",
                SERIAL_ID_LIMIT,
                self.registry.max_serial_id
            );
        }

        if self.admin.api_key.is_empty() {
            bail!("admin api_key must not be empty");
        }

        if let Some(url) = &self.notify.webhook_url {
            if url.is_empty() {
                bail!("webhook_url must not be empty when set");
            }
        }

        if self.notify.timeout_secs == 0 {
            bail!("notify timeout_secs must be greater than 0");
        }

        if self.notify.queue_capacity == 0 {
            bail!("notify queue_capacity must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [server]
        port = 8080

        [admin]
        api_key = "secret"
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::parse(MINIMAL).unwrap();

        assert_eq!(config.server.port, Some(8080));
        assert!(config.server.num_threads > 0);
        assert_eq!(config.registry.max_serial_id, 16);
        assert_eq!(config.registry.wal_path, PathBuf::from("registry.wal"));
        assert_eq!(config.notify.webhook_url, None);
        assert_eq!(config.notify.timeout(), Duration::from_secs(10));
        assert_eq!(config.notify.queue_capacity, 256);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [server]
            unix_socket = "/run/registry.sock"
            num_threads = 2

            [registry]
            max_serial_id = 32
            wal_path = "/var/lib/registry/users.wal"

            [admin]
            api_key = "secret"

            [notify]
            webhook_url = "http://localhost:9000/hook"
            api_key = "hook-key"
            timeout_secs = 3
            queue_capacity = 8

            [logging]
            level = "debug"
            format = "console"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, None);
        assert_eq!(config.server.unix_socket, Some(PathBuf::from("/run/registry.sock")));
        assert_eq!(config.registry.max_serial_id, 32);
        assert_eq!(config.notify.api_key.as_deref(), Some("hook-key"));
        assert_eq!(config.notify.queue_capacity, 8);
        assert_eq!(config.logging.format, LogFormat::Console);
    }

    #[test]
    fn test_requires_listener() {
        let result = Config::parse(
            r#"
            [server]
            num_threads = 1
            [admin]
            api_key = "secret"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            MINIMAL.replace("port = 8080", "port = 0"),
            MINIMAL.replace("\"secret\"", "\"\""),
            format!("{}\n[registry]\nmax_serial_id = 0\n", MINIMAL),
            format!("{}\n[registry]\nmax_serial_id = 5000\n", MINIMAL),
            format!("{}\n[notify]\ntimeout_secs = 0\n", MINIMAL),
            format!("{}\n[notify]\nqueue_capacity = 0\n", MINIMAL),
            format!("{}\n[logging]\nlevel = \"loud\"\n", MINIMAL),
            format!("{}\n[logging]\nformat = \"xml\"\n", MINIMAL),
        ];

        for content in cases {
            assert!(Config::parse(&content).is_err(), "should reject:\n{}", content);
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.admin.api_key, "secret");
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file(Path::new("/nonexistent/registry.toml")).is_err());
    }
}
