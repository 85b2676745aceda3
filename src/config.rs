use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the recruiting API (the `/chat` endpoints live under it)
    pub api_url: String,
    /// Bearer token for the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Use `/chat/stream` first; when false only `/chat` is called
    pub streaming: bool,
    /// Ask the assistant for encouraging replies
    pub encouragement_mode: bool,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for the synchronous endpoint, in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            api_token: None,
            streaming: true,
            encouragement_mode: false,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Default location: `~/.hirestream/config.toml`
    pub fn default_path() -> PathBuf {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home_dir.join(".hirestream").join("config.toml")
    }

    /// Load configuration from file, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// `HIRESTREAM_API_URL` and `HIRESTREAM_TOKEN` override the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("HIRESTREAM_API_URL").ok(),
            std::env::var("HIRESTREAM_TOKEN").ok(),
        );
    }

    fn apply_overrides(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.api_token = Some(token);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = path.unwrap_or_else(Self::default_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::from_file(&missing).is_err());

        let config = Config::load(Some(missing)).unwrap();
        assert!(config.streaming);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://ats.example.com/api\"\nstreaming = false\n")
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api_url, "https://ats.example.com/api");
        assert!(!config.streaming);
        assert_eq!(config.request_timeout_secs, 120);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            api_token: Some("tok".into()),
            encouragement_mode: true,
            ..Default::default()
        };
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.api_token.as_deref(), Some("tok"));
        assert!(loaded.encouragement_mode);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".into()), Some("secret".into()));
        assert_eq!(config.api_url, Config::default().api_url);
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }
}
