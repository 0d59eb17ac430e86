//! Command handlers behind the CLI. Each handler writes its report to the given writer and
//! closes every service it acquired before returning.

pub mod daily;
pub mod dump;
pub mod list;
pub mod login;
pub mod pagination;
pub mod status;
pub mod sync;

use crate::domain::Service;
use crate::error::ServiceError;

fn ensure_authenticated(service: &dyn Service) -> Result<(), ServiceError> {
    if service.authenticated() {
        Ok(())
    } else {
        Err(ServiceError::NotAuthenticated(service.name().to_string()))
    }
}
