use std::io::Write;

use super::ensure_authenticated;
use super::pagination::Pagination;
use crate::domain::{Service, ServiceLoader, close_after};
use crate::error::ServiceError;

/// Print the loved tracks of `service_name`, one `<artist> - <name>` line each.
pub async fn list<W: Write>(
    loader: &dyn ServiceLoader,
    service_name: &str,
    pagination: Pagination,
    out: &mut W,
) -> Result<(), ServiceError> {
    let mut service = loader.for_name(service_name)?;
    let result = print_loved_tracks(service.as_mut(), pagination, out).await;
    close_after(service.as_mut(), result).await
}

async fn print_loved_tracks<W: Write>(
    service: &mut dyn Service,
    pagination: Pagination,
    out: &mut W,
) -> Result<(), ServiceError> {
    ensure_authenticated(service)?;

    let mut pages = pagination.pages();
    while let Some(tracks) = pages.next_page(service).await? {
        for track in tracks {
            writeln!(out, "{}", track)?;
        }
    }

    Ok(())
}
