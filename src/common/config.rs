//! Configuration file handling

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Headers sent with every request (e.g. `User-Agent`)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Report output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Coloured console summary
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

/// Default settings
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// Backend base URL, including any API prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Report format when `--format` is not given
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            format: OutputFormat::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Per-request timeout; expiry fails the step as a connection error
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
        }
    }
}

fn default_request() -> u64 {
    10
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.defaults.base_url, "http://127.0.0.1:3000/api");
        assert_eq!(config.defaults.format, OutputFormat::Text);
        assert_eq!(config.timeouts.request_secs, 10);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[defaults]
base_url = "http://localhost:8080/v1"
format = "json"

[timeouts]
request_secs = 3

[headers]
User-Agent = "authprobe-test"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults.base_url, "http://localhost:8080/v1");
        assert_eq!(config.defaults.format, OutputFormat::Json);
        assert_eq!(config.timeouts.request(), Duration::from_secs(3));
        assert_eq!(
            config.headers.get("User-Agent").map(String::as_str),
            Some("authprobe-test")
        );
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nrequest_secs = \"soon\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/authprobe.toml")).unwrap_err();
        assert!(matches!(err, super::super::Error::FileRead { .. }));
    }
}
