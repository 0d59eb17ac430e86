use std::io::Write;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::{NAME, Spotify, to_track};
use crate::error::{BoxError, ServiceError};
use crate::ports::spotify::{SpotifyApiTrack, TimeRange};

const TOP_ITEMS_LIMIT: u32 = 50;
const RECOMMENDATIONS_LIMIT: u32 = 100;
const SEED_ARTISTS: usize = 2;
const SEED_TRACKS: usize = 3;
const DISCOVER_WEEKLY: &str = "Discover Weekly";
const PLAYLIST_PAGE_SIZE: u32 = 50;

fn playlist_error(context: &'static str) -> impl FnOnce(color_eyre::Report) -> ServiceError {
    move |error| ServiceError::Playlist {
        service: NAME,
        context,
        source: BoxError::from(error),
    }
}

fn track_ids(tracks: &[SpotifyApiTrack]) -> Vec<String> {
    tracks.iter().filter_map(|track| track.id.clone()).collect()
}

impl Spotify {
    async fn user_id(&mut self) -> Result<String, ServiceError> {
        let user = self
            .client()?
            .current_user()
            .await
            .map_err(|error| ServiceError::ProfileRead {
                service: NAME,
                source: error.into(),
            })?;
        Ok(user.id)
    }

    /// Create a `Discover Daily` playlist for `today` from recommendations seeded with a random
    /// selection of the user's top artists and tracks.
    pub async fn discover_daily<W: Write, R: Rng>(
        &mut self,
        out: &mut W,
        rng: &mut R,
        today: NaiveDate,
    ) -> Result<(), ServiceError> {
        let user_id = self.user_id().await?;
        let time_range = *TimeRange::ALL.choose(rng).unwrap_or(&TimeRange::MediumTerm);
        log::info!("Building Discover Daily from {} top items", time_range);

        let client = self.client()?;

        let mut artist_ids: Vec<String> = client
            .top_artists(time_range, TOP_ITEMS_LIMIT)
            .await
            .map_err(playlist_error("failed to read top artists"))?
            .into_iter()
            .map(|artist| artist.id)
            .collect();
        artist_ids.shuffle(rng);
        artist_ids.truncate(SEED_ARTISTS);

        let top_tracks = client
            .top_tracks(time_range, TOP_ITEMS_LIMIT)
            .await
            .map_err(playlist_error("failed to read top tracks"))?;
        let mut seed_track_ids = track_ids(&top_tracks);
        seed_track_ids.shuffle(rng);
        seed_track_ids.truncate(SEED_TRACKS);

        let recommended = client
            .recommendations(&artist_ids, &seed_track_ids, RECOMMENDATIONS_LIMIT)
            .await
            .map_err(playlist_error("failed to read recommendations"))?;

        for track in &recommended {
            writeln!(out, "{}", to_track(track.clone()))?;
        }

        let date = today.format("%d-%m-%Y");
        let name = format!("Discover Daily {}", date);
        let description = format!(
            "Discover Daily playlist for {} from recommendations of {} top items",
            date, time_range
        );
        let playlist = client
            .create_playlist(&user_id, &name, &description, true)
            .await
            .map_err(playlist_error("failed to create playlist"))?;

        let ids = track_ids(&recommended);
        if !ids.is_empty() {
            client
                .add_playlist_tracks(&playlist.id, &ids)
                .await
                .map_err(playlist_error("failed to add tracks to playlist"))?;
        }

        log::info!("Created playlist {} with {} tracks", name, ids.len());
        Ok(())
    }

    /// Copy the current `Discover Weekly` playlist into a new playlist named after the ISO week
    /// of `today`.
    pub async fn dump_discover_weekly<W: Write>(
        &mut self,
        out: &mut W,
        today: NaiveDate,
    ) -> Result<(), ServiceError> {
        let user_id = self.user_id().await?;
        writeln!(out, "UserID: {}", user_id)?;

        let week = today.iso_week();
        let name = format!("Discover Weekly #{} {}", week.week(), week.year());
        let description = format!(
            "Backup of the Discover Weekly playlist for week {} in {}.",
            week.week(),
            week.year()
        );

        let client = self.client()?;
        let backup = client
            .create_playlist(&user_id, &name, &description, true)
            .await
            .map_err(playlist_error("failed to create playlist"))?;

        let source = client
            .search_playlists(DISCOVER_WEEKLY, 1)
            .await
            .map_err(playlist_error("failed to search Discover Weekly playlist"))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::PlaylistNotFound(DISCOVER_WEEKLY.to_string()))?;
        writeln!(out, "PlaylistID: {}", source.id)?;

        let mut offset = 0;
        for page in 1.. {
            let items = client
                .playlist_tracks(&source.id, PLAYLIST_PAGE_SIZE, offset)
                .await
                .map_err(playlist_error("failed to read playlist tracks"))?;
            writeln!(out, "Playlist has {} total tracks", items.total)?;

            let count = items.item_count;
            writeln!(out, "Page {} has {} tracks", page, count)?;
            if count == 0 {
                break;
            }

            for track in &items.tracks {
                writeln!(out, "{}", to_track(track.clone()))?;
            }

            let ids = track_ids(&items.tracks);
            if page == 1 {
                client
                    .replace_playlist_tracks(&backup.id, &ids)
                    .await
                    .map_err(playlist_error("failed to replace tracks in playlist"))?;
            } else if !ids.is_empty() {
                client
                    .add_playlist_tracks(&backup.id, &ids)
                    .await
                    .map_err(playlist_error("failed to add tracks to playlist"))?;
            }

            if count < PLAYLIST_PAGE_SIZE as usize {
                break;
            }
            offset += count as u32;
        }

        Ok(())
    }
}
