use std::path::{Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::{Context, eyre};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/callback";

const APP_DIRECTORY: &str = "lovesync";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where backends send the user after granting access
    redirect_url: String,
    /// Directory holding one secrets file per service
    secrets_directory: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            secrets_directory: Self::app_directory()
                .map(|path| path.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("~/.config/{}", APP_DIRECTORY)),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    fn app_directory() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIRECTORY))
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::app_directory().map(|path| path.join("config.toml"))
    }

    /// Load the default config file, falling back to defaults when there is none
    pub fn load() -> Result<Self> {
        let config_path =
            Self::config_path().ok_or_else(|| eyre!("Could not determine config directory"))?;

        if !config_path.exists() {
            log::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::from_file(&config_path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Get expanded secrets directory path
    pub fn secrets_path(&self) -> PathBuf {
        self.expand_path(&self.secrets_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "secrets_directory = \"/tmp/lovesync-secrets\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.redirect_url(), DEFAULT_REDIRECT_URL);
        assert_eq!(config.secrets_path(), PathBuf::from("/tmp/lovesync-secrets"));
    }

    #[test]
    fn test_from_file_reads_redirect_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "redirect_url = \"http://127.0.0.1:9000/auth\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.redirect_url(), "http://127.0.0.1:9000/auth");
    }

    #[test]
    fn test_from_file_missing_file_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let result = Config::from_file(&directory.path().join("missing.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "redirect_url = ").unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_expand_home_directory() {
        let config = Config::default();
        let expanded = config.expand_path("~/secrets");

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("secrets"));
        }
        assert_eq!(config.expand_path("/abs/path"), PathBuf::from("/abs/path"));
    }
}
