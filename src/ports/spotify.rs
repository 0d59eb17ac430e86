use color_eyre::eyre::Result;

use crate::session::OAuthToken;
pub use crate::spotify_rs::types::TimeRange;

/// Decoupled representation of a Spotify user from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub name: String,
}

/// Decoupled representation of a Spotify track from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiTrack {
    /// `None` for local files, which cannot be added anywhere.
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SpotifyApiArtist {
    pub id: String,
    pub name: String,
}

/// One page of playlist items plus the playlist's total size.
#[derive(Debug, Clone)]
pub struct SpotifyApiTrackPage {
    pub total: u32,
    /// Items on this page, including removed ones that carry no track.
    pub item_count: usize,
    pub tracks: Vec<SpotifyApiTrack>,
}

/// Port trait for the Spotify OAuth authorization-code flow.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyAuthenticator: Send + Sync {
    fn auth_url(&self, redirect_url: &str) -> String;

    async fn exchange(&self, code: &str, redirect_url: &str) -> Result<OAuthToken>;

    /// Build an API client around an existing token without contacting Spotify.
    fn client(&self, token: OAuthToken) -> Box<dyn SpotifyApi>;
}

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Methods take `&mut self` because an expired token is refreshed on the way.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyApi: Send {
    async fn current_user(&mut self) -> Result<SpotifyApiUser>;

    async fn saved_tracks(&mut self, limit: u32, offset: u32) -> Result<Vec<SpotifyApiTrack>>;

    async fn search_tracks(&mut self, query: &str, limit: u32) -> Result<Vec<SpotifyApiTrack>>;

    async fn save_tracks(&mut self, track_ids: &[String]) -> Result<()>;

    async fn search_playlists(&mut self, query: &str, limit: u32)
    -> Result<Vec<SpotifyApiPlaylist>>;

    async fn playlist_tracks(
        &mut self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<SpotifyApiTrackPage>;

    async fn create_playlist(
        &mut self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist>;

    async fn replace_playlist_tracks(&mut self, playlist_id: &str, track_ids: &[String])
    -> Result<()>;

    async fn add_playlist_tracks(&mut self, playlist_id: &str, track_ids: &[String]) -> Result<()>;

    async fn top_artists(&mut self, time_range: TimeRange, limit: u32)
    -> Result<Vec<SpotifyApiArtist>>;

    async fn top_tracks(&mut self, time_range: TimeRange, limit: u32)
    -> Result<Vec<SpotifyApiTrack>>;

    async fn recommendations(
        &mut self,
        seed_artists: &[String],
        seed_tracks: &[String],
        limit: u32,
    ) -> Result<Vec<SpotifyApiTrack>>;

    /// The token currently in use, including any silent refresh.
    fn token(&self) -> Result<OAuthToken>;
}
