use std::io::Write;

use crate::domain::{Service, ServiceLoader, close_after};
use crate::error::ServiceError;

/// Report the login state of every registered service.
pub async fn status<W: Write>(loader: &dyn ServiceLoader, out: &mut W) -> Result<(), ServiceError> {
    for name in loader.names() {
        let mut service = loader.for_name(&name)?;
        let result = print_status(service.as_mut(), out).await;
        close_after(service.as_mut(), result).await?;
    }

    Ok(())
}

async fn print_status<W: Write>(service: &mut dyn Service, out: &mut W) -> Result<(), ServiceError> {
    if service.authenticated() {
        let username = service.username().await?;
        writeln!(out, "{}\n\tAuthenticated as {}", service.name(), username)?;
    } else {
        writeln!(out, "{}\n\tNot logged in", service.name())?;
    }

    Ok(())
}
