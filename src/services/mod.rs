pub mod lastfm;
pub mod spotify;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Service, ServiceLoader};
use crate::error::ServiceError;
use crate::secrets::{Secrets, SecretsLoader};

/// Builds a service around its (already loaded) secrets unit.
pub type ServiceFactory =
    Box<dyn Fn(Box<dyn Secrets>) -> Result<Box<dyn Service>, ServiceError> + Send + Sync>;

/// Lowercase and drop everything outside `[a-zA-Z0-9]`, so `Last.fm`, `LASTFM` and `last-fm`
/// all refer to the same service.
pub fn normalize_service_name(service_name: &str) -> String {
    service_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Key of the secrets unit belonging to a service.
pub fn secrets_name(service_name: &str) -> String {
    format!("secrets-{}", normalize_service_name(service_name))
}

/// Service registry backed by a fixed name to factory table.
pub struct MapServiceLoader {
    services: BTreeMap<String, ServiceFactory>,
    secrets_loader: Arc<dyn SecretsLoader>,
}

impl MapServiceLoader {
    pub fn new(secrets_loader: Arc<dyn SecretsLoader>) -> Self {
        Self {
            services: BTreeMap::new(),
            secrets_loader,
        }
    }

    pub fn register<F>(mut self, service_name: &str, factory: F) -> Self
    where
        F: Fn(Box<dyn Secrets>) -> Result<Box<dyn Service>, ServiceError> + Send + Sync + 'static,
    {
        self.services
            .insert(normalize_service_name(service_name), Box::new(factory));
        self
    }
}

impl ServiceLoader for MapServiceLoader {
    fn for_name(&self, service_name: &str) -> Result<Box<dyn Service>, ServiceError> {
        let normalized = normalize_service_name(service_name);
        let factory = self
            .services
            .get(&normalized)
            .ok_or_else(|| ServiceError::UnknownService(service_name.to_string()))?;

        let name = secrets_name(&normalized);
        log::debug!("Loading {} for service {}", name, normalized);
        let secrets = self
            .secrets_loader
            .load(&name)
            .map_err(|source| ServiceError::ConfigLoad { name, source })?;

        factory(secrets)
    }

    fn names(&self) -> Vec<String> {
        // BTreeMap iterates in key order.
        self.services.keys().cloned().collect()
    }
}

/// Registry of every backend this binary ships with.
pub fn available_services(secrets_loader: Arc<dyn SecretsLoader>) -> MapServiceLoader {
    MapServiceLoader::new(secrets_loader)
        .register(
            "spotify",
            |secrets| Ok(Box::new(spotify::Spotify::from_env(secrets)?)),
        )
        .register(
            "lastfm",
            |secrets| Ok(Box::new(lastfm::Lastfm::from_env(secrets)?)),
        )
}
