// Configuration: everything the pipeline needs, loaded once at startup and
// passed down explicitly. Sources, lowest priority first: built-in defaults,
// an optional JSON file in the user's config directory, environment
// variables.

use crate::api::parse_base_url;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ea1.aconex.com/api/";
pub const DEFAULT_DOCUMENT_COUNT: usize = 5;
pub const DEFAULT_CONCURRENCY: usize = 8;

pub const ENV_BASE_URL: &str = "ACONEX_BASE_URL";
pub const ENV_USERNAME: &str = "ACONEX_USERNAME";
pub const ENV_PASSWORD: &str = "ACONEX_PASSWORD";
pub const ENV_DOCUMENT_COUNT: &str = "ACONEX_DOCUMENT_COUNT";
pub const ENV_CONCURRENCY: &str = "ACONEX_CONCURRENCY";
pub const ENV_TIMEOUT_SECS: &str = "ACONEX_TIMEOUT_SECS";
pub const ENV_STRICT_VERIFY: &str = "ACONEX_STRICT_VERIFY";

/// Login credentials. `Debug` hides the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub credentials: Credentials,
    /// Number of synthetic documents uploaded to the source project.
    pub document_count: usize,
    /// Maximum in-flight requests per batch stage.
    pub concurrency: usize,
    pub request_timeout: Option<Duration>,
    /// Compare the transferred set against the target listing instead of
    /// only checking that the listing succeeds.
    pub strict_verify: bool,
}

/// On-disk shape of the config file. Every field is optional.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub document_count: Option<usize>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub strict_verify: Option<bool>,
}

impl ConfigFile {
    /// Read the file at `path`. A missing file yields the empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply environment overrides from `lookup` on top of the file values.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BASE_URL) {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup(ENV_USERNAME) {
            self.username = Some(v);
        }
        if let Some(v) = lookup(ENV_PASSWORD) {
            self.password = Some(v);
        }
        if let Some(v) = lookup(ENV_DOCUMENT_COUNT) {
            self.document_count = Some(parse_env(ENV_DOCUMENT_COUNT, &v)?);
        }
        if let Some(v) = lookup(ENV_CONCURRENCY) {
            self.concurrency = Some(parse_env(ENV_CONCURRENCY, &v)?);
        }
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = Some(parse_env(ENV_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_STRICT_VERIFY) {
            self.strict_verify = Some(parse_bool(ENV_STRICT_VERIFY, &v)?);
        }
        Ok(self)
    }

    /// Fill defaults and check required values.
    pub fn into_config(self) -> Result<Config> {
        let username = self.username.filter(|u| !u.is_empty());
        let password = self.password.filter(|p| !p.is_empty());
        let (Some(username), Some(password)) = (username, password) else {
            anyhow::bail!(
                "Missing credentials: set {} and {} or add them to the config file",
                ENV_USERNAME,
                ENV_PASSWORD
            );
        };
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into());
        parse_base_url(&base_url)?;
        Ok(Config {
            base_url,
            credentials: Credentials { username, password },
            document_count: self.document_count.unwrap_or(DEFAULT_DOCUMENT_COUNT),
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
            request_timeout: self.timeout_secs.map(Duration::from_secs),
            strict_verify: self.strict_verify.unwrap_or(false),
        })
    }
}

impl Config {
    /// Load from the default config file location and the process
    /// environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path(), |key| std::env::var(key).ok())
    }

    /// Load from an explicit file path and variable lookup.
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        ConfigFile::load(path)?.merge_env(lookup)?.into_config()
    }

    /// Config file path (cross-platform).
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("docmigrate");
        path.push("config.json");
        path
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("Invalid value for {}: '{}'", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_given() {
        let config = ConfigFile::default()
            .merge_env(env(&[(ENV_USERNAME, "poleary"), (ENV_PASSWORD, "secret")]))
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.credentials.username, "poleary");
        assert_eq!(config.document_count, 5);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.request_timeout, None);
        assert!(!config.strict_verify);
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = ConfigFile::default()
            .merge_env(env(&[(ENV_USERNAME, "poleary")]))
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(err.to_string().contains(ENV_PASSWORD));

        let empty = ConfigFile {
            username: Some(String::new()),
            password: Some("x".into()),
            ..Default::default()
        };
        assert!(empty.into_config().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"base_url":"http://file.example/api/","username":"file-user","password":"file-pass","concurrency":2}"#,
        )
        .unwrap();

        let config = Config::load_from(
            &path,
            env(&[
                (ENV_USERNAME, "env-user"),
                (ENV_DOCUMENT_COUNT, "12"),
                (ENV_TIMEOUT_SECS, "30"),
                (ENV_STRICT_VERIFY, "yes"),
            ]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://file.example/api/");
        assert_eq!(config.credentials.username, "env-user");
        assert_eq!(config.credentials.password, "file-pass");
        assert_eq!(config.document_count, 12);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert!(config.strict_verify);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ConfigFile::load(&path).is_err());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = ConfigFile::default()
            .merge_env(env(&[(ENV_CONCURRENCY, "many")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CONCURRENCY));
        assert!(ConfigFile::default()
            .merge_env(env(&[(ENV_STRICT_VERIFY, "maybe")]))
            .is_err());
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(
            &dir.path().join("absent.json"),
            env(&[
                (ENV_USERNAME, "u"),
                (ENV_PASSWORD, "p"),
                (ENV_BASE_URL, "not a url"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a url"), "{}", err);

        let ftp = ConfigFile {
            base_url: Some("ftp://example.com/".into()),
            username: Some("u".into()),
            password: Some("p".into()),
            ..Default::default()
        };
        assert!(ftp.into_config().is_err());
    }

    #[test]
    fn zero_concurrency_becomes_one() {
        let file = ConfigFile {
            username: Some("u".into()),
            password: Some("p".into()),
            concurrency: Some(0),
            ..Default::default()
        };
        assert_eq!(file.into_config().unwrap().concurrency, 1);
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials {
            username: "poleary".into(),
            password: "Auth3nt1c".into(),
        };
        let out = format!("{:?}", creds);
        assert!(out.contains("poleary"));
        assert!(!out.contains("Auth3nt1c"));
    }
}
