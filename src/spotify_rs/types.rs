use serde::{Deserialize, Serialize};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Spotify user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Generic paging object used by every list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPage<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
    pub next: Option<String>,
}

/// Spotify track from API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    /// Local files in a library have no id
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub id: Option<String>,
    pub name: String,
}

/// Entry of `/me/tracks`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySavedTrack {
    pub track: SpotifyTrack,
}

/// Entry of `/playlists/{id}/tracks`; removed or unavailable items have no track
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistItem {
    pub track: Option<SpotifyTrack>,
}

/// Spotify playlist from API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrackSearch {
    pub tracks: SpotifyPage<SpotifyTrack>,
}

/// Playlist search results may contain `null` entries
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistSearch {
    pub playlists: SpotifyPage<Option<SpotifyPlaylist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyRecommendations {
    pub tracks: Vec<SpotifyTrack>,
}

/// Time window for the top artists and tracks endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    LongTerm,
    MediumTerm,
    ShortTerm,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [
        TimeRange::LongTerm,
        TimeRange::MediumTerm,
        TimeRange::ShortTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::LongTerm => "long_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::ShortTerm => "short_term",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
