use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Failed to read secrets file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse secrets file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize secrets")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to write secrets file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A namespaced key-value unit holding one backend's session state.
pub trait Secrets: Send {
    fn is_set(&self, key: &str) -> bool;

    /// Returns the stored value, or an empty string when the key is unset.
    fn get(&self, key: &str) -> String;

    fn set(&mut self, key: &str, value: &str);

    /// Persist every value currently held by the unit.
    fn save(&mut self) -> Result<(), SecretsError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait SecretsLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<Box<dyn Secrets>, SecretsError>;
}

/// Secrets unit stored as a flat TOML table.
#[derive(Debug)]
pub struct TomlSecrets {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlSecrets {
    pub fn open(path: PathBuf) -> Result<Self, SecretsError> {
        if !path.exists() {
            log::debug!("No secrets file at {}, starting empty", path.display());
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| SecretsError::Read {
            path: path.clone(),
            source,
        })?;
        let values = toml::from_str(&contents).map_err(|source| SecretsError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, values })
    }
}

impl Secrets for TomlSecrets {
    fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> String {
        self.values.get(key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn save(&mut self) -> Result<(), SecretsError> {
        let write_error = |source| SecretsError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let contents = toml::to_string(&self.values)?;
        std::fs::write(&self.path, contents).map_err(write_error)?;

        // Tokens live in here, keep the file private to the user.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_error)?;
        }

        log::debug!("Saved secrets to {}", self.path.display());
        Ok(())
    }
}

/// Loads secrets units as `<directory>/<name>.toml`.
#[derive(Debug, Clone)]
pub struct TomlSecretsLoader {
    directory: PathBuf,
}

impl TomlSecretsLoader {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

impl SecretsLoader for TomlSecretsLoader {
    fn load(&self, name: &str) -> Result<Box<dyn Secrets>, SecretsError> {
        let path = self.directory.join(format!("{}.toml", name));
        Ok(Box::new(TomlSecrets::open(path)?))
    }
}
