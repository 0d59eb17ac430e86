use std::io::Write;

use super::ensure_authenticated;
use super::pagination::Pagination;
use crate::domain::{Service, ServiceLoader, close_after};
use crate::error::ServiceError;

/// Love every selected loved track of `source_name` on `target_name`, in source order.
pub async fn sync<W: Write>(
    loader: &dyn ServiceLoader,
    source_name: &str,
    target_name: &str,
    pagination: Pagination,
    out: &mut W,
) -> Result<(), ServiceError> {
    let mut source = loader.for_name(source_name)?;
    let mut target = match loader.for_name(target_name) {
        Ok(target) => target,
        Err(error) => return close_after(source.as_mut(), Err(error)).await,
    };

    let result = sync_tracks(source.as_mut(), target.as_mut(), pagination, out).await;
    let result = close_after(target.as_mut(), result).await;
    close_after(source.as_mut(), result).await
}

async fn sync_tracks<W: Write>(
    source: &mut dyn Service,
    target: &mut dyn Service,
    pagination: Pagination,
    out: &mut W,
) -> Result<(), ServiceError> {
    ensure_authenticated(source)?;
    ensure_authenticated(target)?;

    log::info!("Syncing loved tracks from {} to {}", source.name(), target.name());
    let mut pages = pagination.pages();
    while let Some(tracks) = pages.next_page(source).await? {
        for track in tracks {
            target.love_track(&track).await?;
            writeln!(out, "Synced: {}", track)?;
        }
    }

    Ok(())
}
