use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::spotify_rs::types::{
    SpotifyArtist, SpotifyPage, SpotifyPlaylist, SpotifyPlaylistItem, SpotifyPlaylistSearch,
    SpotifyRecommendations, SpotifySavedTrack, SpotifyTrack, SpotifyTrackSearch, SpotifyUser,
    TimeRange,
};

const API_BASE_URL: &str = "https://api.spotify.com/v1";

fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T> {
    request
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .wrap_err_with(|| format!("Failed to request {}", what))?
        .error_for_status()
        .wrap_err_with(|| format!("Spotify rejected request for {}", what))?
        .json::<T>()
        .await
        .wrap_err_with(|| format!("Failed to parse {}", what))
}

async fn send_empty(request: RequestBuilder, what: &str) -> Result<()> {
    request
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .wrap_err_with(|| format!("Failed to {}", what))?
        .error_for_status()
        .wrap_err_with(|| format!("Spotify rejected request to {}", what))?;
    Ok(())
}

/// Get the current user's profile
pub async fn get_current_user(client: &Client, access_token: &str) -> Result<SpotifyUser> {
    let request = client
        .get(format!("{}/me", API_BASE_URL))
        .bearer_auth(access_token);
    send_json(request, "current user profile").await
}

/// One page of the tracks saved in the user's library
pub async fn get_saved_tracks(
    client: &Client,
    access_token: &str,
    limit: u32,
    offset: u32,
) -> Result<SpotifyPage<SpotifySavedTrack>> {
    let request = client
        .get(format!("{}/me/tracks", API_BASE_URL))
        .query(&[("limit", limit), ("offset", offset)])
        .bearer_auth(access_token);
    send_json(request, "saved tracks").await
}

pub async fn save_tracks(client: &Client, access_token: &str, track_ids: &[String]) -> Result<()> {
    let request = client
        .put(format!("{}/me/tracks", API_BASE_URL))
        .json(&json!({ "ids": track_ids }))
        .bearer_auth(access_token);
    send_empty(request, "save tracks to library").await
}

pub async fn search_tracks(
    client: &Client,
    access_token: &str,
    query: &str,
    limit: u32,
) -> Result<Vec<SpotifyTrack>> {
    let request = client
        .get(format!("{}/search", API_BASE_URL))
        .query(&[("q", query), ("type", "track")])
        .query(&[("limit", limit)])
        .bearer_auth(access_token);
    let search: SpotifyTrackSearch = send_json(request, "track search").await?;
    Ok(search.tracks.items)
}

pub async fn search_playlists(
    client: &Client,
    access_token: &str,
    query: &str,
    limit: u32,
) -> Result<Vec<SpotifyPlaylist>> {
    let request = client
        .get(format!("{}/search", API_BASE_URL))
        .query(&[("q", query), ("type", "playlist")])
        .query(&[("limit", limit)])
        .bearer_auth(access_token);
    let search: SpotifyPlaylistSearch = send_json(request, "playlist search").await?;
    Ok(search.playlists.items.into_iter().flatten().collect())
}

/// One page of a playlist's items
pub async fn get_playlist_tracks(
    client: &Client,
    access_token: &str,
    playlist_id: &str,
    limit: u32,
    offset: u32,
) -> Result<SpotifyPage<SpotifyPlaylistItem>> {
    let request = client
        .get(format!("{}/playlists/{}/tracks", API_BASE_URL, playlist_id))
        .query(&[("limit", limit), ("offset", offset)])
        .query(&[("additional_types", "track")])
        .bearer_auth(access_token);
    send_json(request, "playlist tracks").await
}

pub async fn create_playlist(
    client: &Client,
    access_token: &str,
    user_id: &str,
    name: &str,
    description: &str,
    public: bool,
) -> Result<SpotifyPlaylist> {
    let request = client
        .post(format!(
            "{}/users/{}/playlists",
            API_BASE_URL,
            urlencoding::encode(user_id)
        ))
        .json(&json!({
            "name": name,
            "description": description,
            "public": public,
            "collaborative": false,
        }))
        .bearer_auth(access_token);
    send_json(request, "created playlist").await
}

/// Replace every item of a playlist. At most 100 tracks per request.
pub async fn replace_playlist_tracks(
    client: &Client,
    access_token: &str,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<()> {
    let uris: Vec<String> = track_ids.iter().map(|id| track_uri(id)).collect();
    let request = client
        .put(format!("{}/playlists/{}/tracks", API_BASE_URL, playlist_id))
        .json(&json!({ "uris": uris }))
        .bearer_auth(access_token);
    send_empty(request, "replace playlist tracks").await
}

/// Append tracks to a playlist. At most 100 tracks per request.
pub async fn add_playlist_tracks(
    client: &Client,
    access_token: &str,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<()> {
    let uris: Vec<String> = track_ids.iter().map(|id| track_uri(id)).collect();
    let request = client
        .post(format!("{}/playlists/{}/tracks", API_BASE_URL, playlist_id))
        .json(&json!({ "uris": uris }))
        .bearer_auth(access_token);
    send_empty(request, "add playlist tracks").await
}

pub async fn get_top_artists(
    client: &Client,
    access_token: &str,
    time_range: TimeRange,
    limit: u32,
) -> Result<Vec<SpotifyArtist>> {
    let request = client
        .get(format!("{}/me/top/artists", API_BASE_URL))
        .query(&[("time_range", time_range.as_str())])
        .query(&[("limit", limit)])
        .bearer_auth(access_token);
    let page: SpotifyPage<SpotifyArtist> = send_json(request, "top artists").await?;
    Ok(page.items)
}

pub async fn get_top_tracks(
    client: &Client,
    access_token: &str,
    time_range: TimeRange,
    limit: u32,
) -> Result<Vec<SpotifyTrack>> {
    let request = client
        .get(format!("{}/me/top/tracks", API_BASE_URL))
        .query(&[("time_range", time_range.as_str())])
        .query(&[("limit", limit)])
        .bearer_auth(access_token);
    let page: SpotifyPage<SpotifyTrack> = send_json(request, "top tracks").await?;
    Ok(page.items)
}

/// Recommendations accept at most five seeds in total
pub async fn get_recommendations(
    client: &Client,
    access_token: &str,
    seed_artists: &[String],
    seed_tracks: &[String],
    limit: u32,
) -> Result<Vec<SpotifyTrack>> {
    let request = client
        .get(format!("{}/recommendations", API_BASE_URL))
        .query(&[
            ("seed_artists", seed_artists.join(",")),
            ("seed_tracks", seed_tracks.join(",")),
        ])
        .query(&[("limit", limit)])
        .bearer_auth(access_token);
    let recommendations: SpotifyRecommendations =
        send_json(request, "recommendations").await?;
    Ok(recommendations.tracks)
}
