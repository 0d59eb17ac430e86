use std::io::Write;

use chrono::NaiveDate;

use super::ensure_authenticated;
use crate::domain::close_after;
use crate::error::ServiceError;
use crate::services::spotify::Spotify;

/// Back up this week's `Discover Weekly` playlist on Spotify.
pub async fn dump<W: Write>(
    mut spotify: Spotify,
    out: &mut W,
    today: NaiveDate,
) -> Result<(), ServiceError> {
    let result = match ensure_authenticated(&spotify) {
        Ok(()) => spotify.dump_discover_weekly(out, today).await,
        Err(error) => Err(error),
    };
    close_after(&mut spotify, result).await
}
