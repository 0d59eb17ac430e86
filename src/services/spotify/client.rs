use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;

use crate::error::ServiceError;
use crate::ports::spotify::{
    SpotifyApi, SpotifyApiArtist, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiTrackPage,
    SpotifyApiUser, SpotifyAuthenticator, TimeRange,
};
use crate::session::OAuthToken;
use crate::spotify_rs::{auth, client};
use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyTokenResponse, SpotifyTrack};

pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

#[derive(Debug, Clone)]
pub struct SpotifyApiCredentials {
    client_id: String,
    client_secret: String,
}

impl SpotifyApiCredentials {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// Read the app credentials, both variables must be set and non-empty.
    pub fn from_env() -> Result<Self, ServiceError> {
        let client_id = std::env::var(CLIENT_ID_VAR).unwrap_or_default();
        let client_secret = std::env::var(CLIENT_SECRET_VAR).unwrap_or_default();

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(ServiceError::MissingCredentials {
                client_id_var: CLIENT_ID_VAR,
                client_secret_var: CLIENT_SECRET_VAR,
            });
        }

        Ok(Self::new(client_id, client_secret))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

fn token_from_response(response: SpotifyTokenResponse, previous_refresh: &str) -> OAuthToken {
    OAuthToken::expiring_in(
        response.token_type,
        response.access_token,
        response.expires_in,
        // Spotify may omit the refresh token on refresh, the old one stays valid then.
        response
            .refresh_token
            .unwrap_or_else(|| previous_refresh.to_string()),
    )
}

pub struct SpotifyHttpAuthenticator {
    client: Client,
    credentials: SpotifyApiCredentials,
}

impl SpotifyHttpAuthenticator {
    pub fn new(credentials: SpotifyApiCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }
}

#[async_trait::async_trait]
impl SpotifyAuthenticator for SpotifyHttpAuthenticator {
    fn auth_url(&self, redirect_url: &str) -> String {
        auth::authorize_url(self.credentials.client_id(), redirect_url)
    }

    async fn exchange(&self, code: &str, redirect_url: &str) -> Result<OAuthToken> {
        let response = auth::exchange_code_for_token(
            &self.client,
            self.credentials.client_id(),
            self.credentials.client_secret(),
            code,
            redirect_url,
        )
        .await?;

        Ok(token_from_response(response, ""))
    }

    fn client(&self, token: OAuthToken) -> Box<dyn SpotifyApi> {
        Box::new(SpotifyHttpAdapter {
            client: self.client.clone(),
            credentials: self.credentials.clone(),
            token,
        })
    }
}

/// Spotify API client that refreshes its token when it runs out.
pub struct SpotifyHttpAdapter {
    client: Client,
    credentials: SpotifyApiCredentials,
    token: OAuthToken,
}

impl SpotifyHttpAdapter {
    async fn access_token(&mut self) -> Result<String> {
        if self.token.is_expired() && self.token.can_refresh() {
            log::debug!("Spotify access token expired, refreshing");
            let response = auth::refresh_access_token(
                &self.client,
                self.credentials.client_id(),
                self.credentials.client_secret(),
                &self.token.refresh_token,
            )
            .await
            .wrap_err("Failed to refresh Spotify access token")?;
            self.token = token_from_response(response, &self.token.refresh_token);
        }

        Ok(self.token.access_token.clone())
    }
}

fn to_api_track(track: SpotifyTrack) -> SpotifyApiTrack {
    SpotifyApiTrack {
        id: track.id,
        name: track.name,
        artists: track.artists.into_iter().map(|artist| artist.name).collect(),
    }
}

fn to_api_playlist(playlist: SpotifyPlaylist) -> SpotifyApiPlaylist {
    SpotifyApiPlaylist {
        id: playlist.id,
        name: playlist.name,
    }
}

#[async_trait::async_trait]
impl SpotifyApi for SpotifyHttpAdapter {
    async fn current_user(&mut self) -> Result<SpotifyApiUser> {
        let access_token = self.access_token().await?;
        let user = client::get_current_user(&self.client, &access_token).await?;
        Ok(SpotifyApiUser {
            id: user.id,
            display_name: user.display_name,
        })
    }

    async fn saved_tracks(&mut self, limit: u32, offset: u32) -> Result<Vec<SpotifyApiTrack>> {
        let access_token = self.access_token().await?;
        let page = client::get_saved_tracks(&self.client, &access_token, limit, offset).await?;
        Ok(page
            .items
            .into_iter()
            .map(|saved| to_api_track(saved.track))
            .collect())
    }

    async fn search_tracks(&mut self, query: &str, limit: u32) -> Result<Vec<SpotifyApiTrack>> {
        let access_token = self.access_token().await?;
        let tracks = client::search_tracks(&self.client, &access_token, query, limit).await?;
        Ok(tracks.into_iter().map(to_api_track).collect())
    }

    async fn save_tracks(&mut self, track_ids: &[String]) -> Result<()> {
        let access_token = self.access_token().await?;
        client::save_tracks(&self.client, &access_token, track_ids).await
    }

    async fn search_playlists(
        &mut self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SpotifyApiPlaylist>> {
        let access_token = self.access_token().await?;
        let playlists = client::search_playlists(&self.client, &access_token, query, limit).await?;
        Ok(playlists.into_iter().map(to_api_playlist).collect())
    }

    async fn playlist_tracks(
        &mut self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<SpotifyApiTrackPage> {
        let access_token = self.access_token().await?;
        let page =
            client::get_playlist_tracks(&self.client, &access_token, playlist_id, limit, offset)
                .await?;
        Ok(SpotifyApiTrackPage {
            total: page.total,
            item_count: page.items.len(),
            tracks: page
                .items
                .into_iter()
                .filter_map(|item| item.track)
                .map(to_api_track)
                .collect(),
        })
    }

    async fn create_playlist(
        &mut self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist> {
        let access_token = self.access_token().await?;
        let playlist = client::create_playlist(
            &self.client,
            &access_token,
            user_id,
            name,
            description,
            public,
        )
        .await?;
        Ok(to_api_playlist(playlist))
    }

    async fn replace_playlist_tracks(
        &mut self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<()> {
        let access_token = self.access_token().await?;
        client::replace_playlist_tracks(&self.client, &access_token, playlist_id, track_ids).await
    }

    async fn add_playlist_tracks(&mut self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let access_token = self.access_token().await?;
        client::add_playlist_tracks(&self.client, &access_token, playlist_id, track_ids).await
    }

    async fn top_artists(
        &mut self,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<SpotifyApiArtist>> {
        let access_token = self.access_token().await?;
        let artists = client::get_top_artists(&self.client, &access_token, time_range, limit).await?;
        Ok(artists
            .into_iter()
            .filter_map(|artist| {
                Some(SpotifyApiArtist {
                    id: artist.id?,
                    name: artist.name,
                })
            })
            .collect())
    }

    async fn top_tracks(
        &mut self,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<SpotifyApiTrack>> {
        let access_token = self.access_token().await?;
        let tracks = client::get_top_tracks(&self.client, &access_token, time_range, limit).await?;
        Ok(tracks.into_iter().map(to_api_track).collect())
    }

    async fn recommendations(
        &mut self,
        seed_artists: &[String],
        seed_tracks: &[String],
        limit: u32,
    ) -> Result<Vec<SpotifyApiTrack>> {
        let access_token = self.access_token().await?;
        let tracks = client::get_recommendations(
            &self.client,
            &access_token,
            seed_artists,
            seed_tracks,
            limit,
        )
        .await?;
        Ok(tracks.into_iter().map(to_api_track).collect())
    }

    fn token(&self) -> Result<OAuthToken> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(refresh_token: Option<&str>) -> SpotifyTokenResponse {
        SpotifyTokenResponse {
            access_token: "fresh".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
            refresh_token: refresh_token.map(str::to_string),
            scope: None,
        }
    }

    #[test]
    fn test_token_from_response_keeps_previous_refresh_token() {
        let token = token_from_response(response(None), "old-refresh");

        assert_eq!(token.access_token, "fresh");
        assert_eq!(token.refresh_token, "old-refresh");
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_from_response_prefers_new_refresh_token() {
        let token = token_from_response(response(Some("new-refresh")), "old-refresh");
        assert_eq!(token.refresh_token, "new-refresh");
    }

    #[test]
    fn test_client_is_built_without_network() {
        let authenticator = SpotifyHttpAuthenticator::new(SpotifyApiCredentials::new(
            "id".into(),
            "secret".into(),
        ));
        let token = OAuthToken::expiring_in("Bearer".into(), "a".into(), 60, "r".into());

        let client = authenticator.client(token.clone());

        assert_eq!(client.token().unwrap(), token);
        assert!(authenticator.auth_url("http://localhost:8080/callback").contains("client_id=id"));
    }
}
