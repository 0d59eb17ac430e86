use std::io::Write;

use chrono::NaiveDate;
use rand::Rng;

use super::ensure_authenticated;
use crate::domain::close_after;
use crate::error::ServiceError;
use crate::services::spotify::Spotify;

/// Create today's `Discover Daily` playlist on Spotify.
pub async fn daily<W: Write, R: Rng>(
    mut spotify: Spotify,
    out: &mut W,
    rng: &mut R,
    today: NaiveDate,
) -> Result<(), ServiceError> {
    let result = match ensure_authenticated(&spotify) {
        Ok(()) => spotify.discover_daily(out, rng, today).await,
        Err(error) => Err(error),
    };
    close_after(&mut spotify, result).await
}
