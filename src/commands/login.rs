use std::io::Write;

use crate::callback::CallbackProvider;
use crate::domain::{Service, ServiceLoader, close_after};
use crate::error::ServiceError;

/// Log in on `service_name`. Without a `code`, the user is sent through the backend's consent
/// page and the code is read from the redirect.
pub async fn login<W: Write>(
    loader: &dyn ServiceLoader,
    callback: &dyn CallbackProvider,
    redirect_url: &str,
    service_name: &str,
    code: Option<String>,
    out: &mut W,
) -> Result<(), ServiceError> {
    let mut service = loader.for_name(service_name)?;
    let result = authenticate(service.as_mut(), callback, redirect_url, code, out).await;
    close_after(service.as_mut(), result).await
}

async fn authenticate<W: Write>(
    service: &mut dyn Service,
    callback: &dyn CallbackProvider,
    redirect_url: &str,
    code: Option<String>,
    out: &mut W,
) -> Result<(), ServiceError> {
    let code = match code {
        Some(code) => code,
        None => {
            writeln!(
                out,
                "{} authentication URL: {}",
                service.name(),
                service.create_auth_url(redirect_url)
            )?;
            out.flush()?;

            callback
                .read_code(service.code_param())
                .await
                .map_err(|error| ServiceError::authentication(service.name(), error))?
        }
    };

    service.authenticate(&code, redirect_url).await?;
    let username = service.username().await?;
    writeln!(out, "Logged in on {} as {}", service.name(), username)?;

    Ok(())
}
