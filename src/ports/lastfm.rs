use color_eyre::eyre::Result;

/// Decoupled representation of a Last.fm session from the API.
#[derive(Debug, Clone)]
pub struct LastfmApiSession {
    pub username: String,
    pub key: String,
}

/// Decoupled representation of a loved Last.fm track from the API.
#[derive(Debug, Clone)]
pub struct LastfmApiTrack {
    pub artist: String,
    pub name: String,
}

/// Port trait wrapping the Last.fm web services used by business logic.
///
/// Last.fm sessions do not expire, so calls take the session key directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LastfmApi: Send + Sync {
    fn auth_url(&self, redirect_url: &str) -> String;

    async fn session(&self, token: &str) -> Result<LastfmApiSession>;

    async fn username(&self, session_key: &str) -> Result<String>;

    async fn loved_tracks(&self, user: &str, limit: u32, page: u32)
    -> Result<Vec<LastfmApiTrack>>;

    async fn love_track(&self, session_key: &str, artist: &str, track: &str) -> Result<()>;
}
