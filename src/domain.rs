use std::fmt;

use crate::error::ServiceError;

/// A loved track as seen by any backend. Backends match tracks by artist and title only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub artist: String,
    pub name: String,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.name)
    }
}

/// Capabilities every music backend exposes.
///
/// A service owns its secrets unit for its whole lifetime and must be closed exactly once,
/// which persists any session obtained or refreshed while it was in use.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Service: Send {
    /// Human readable backend name.
    fn name(&self) -> &'static str;

    fn authenticated(&self) -> bool;

    fn create_auth_url(&self, redirect_url: &str) -> String;

    /// Query parameter carrying the authorization code in the OAuth callback.
    fn code_param(&self) -> &'static str;

    async fn authenticate(&mut self, code: &str, redirect_url: &str) -> Result<(), ServiceError>;

    async fn username(&mut self) -> Result<String, ServiceError>;

    /// One page of loved tracks. `page` starts at 1.
    async fn loved_tracks(&mut self, limit: u32, page: u32) -> Result<Vec<Track>, ServiceError>;

    /// Find the track on this backend and love it. Finding nothing is not an error.
    async fn love_track(&mut self, track: &Track) -> Result<(), ServiceError>;

    async fn close(&mut self) -> Result<(), ServiceError>;
}

/// Resolves service names to ready-to-use service instances.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceLoader: Send + Sync {
    fn for_name(&self, service_name: &str) -> Result<Box<dyn Service>, ServiceError>;

    /// Registered service names, sorted.
    fn names(&self) -> Vec<String>;
}

/// Close `service` and hand back `result`.
///
/// The service is closed on both the success and the failure path. An error from the
/// operation itself wins over an error from closing.
pub async fn close_after<T>(
    service: &mut dyn Service,
    result: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let closed = service.close().await;
    match (result, closed) {
        (Err(error), Err(close_error)) => {
            log::warn!("Failed to close {}: {}", service.name(), close_error);
            Err(error)
        }
        (Err(error), Ok(())) => Err(error),
        (Ok(_), Err(close_error)) => Err(close_error),
        (Ok(value), Ok(())) => Ok(value),
    }
}
