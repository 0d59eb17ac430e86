use color_eyre::eyre::Result;
use reqwest::Client;

use crate::error::ServiceError;
use crate::lastfm_rs::client;
use crate::ports::lastfm::{LastfmApi, LastfmApiSession, LastfmApiTrack};

pub const CLIENT_ID_VAR: &str = "LASTFM_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "LASTFM_CLIENT_SECRET";

#[derive(Debug, Clone)]
pub struct LastfmApiCredentials {
    api_key: String,
    api_secret: String,
}

impl LastfmApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    pub fn from_env() -> Result<Self, ServiceError> {
        let api_key = std::env::var(CLIENT_ID_VAR).unwrap_or_default();
        let api_secret = std::env::var(CLIENT_SECRET_VAR).unwrap_or_default();

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(ServiceError::MissingCredentials {
                client_id_var: CLIENT_ID_VAR,
                client_secret_var: CLIENT_SECRET_VAR,
            });
        }

        Ok(Self::new(api_key, api_secret))
    }
}

pub struct LastfmHttpAdapter {
    client: Client,
    credentials: LastfmApiCredentials,
}

impl LastfmHttpAdapter {
    pub fn new(credentials: LastfmApiCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }
}

#[async_trait::async_trait]
impl LastfmApi for LastfmHttpAdapter {
    fn auth_url(&self, redirect_url: &str) -> String {
        client::auth_url(&self.credentials.api_key, redirect_url)
    }

    async fn session(&self, token: &str) -> Result<LastfmApiSession> {
        let session = client::get_session(
            &self.client,
            &self.credentials.api_key,
            &self.credentials.api_secret,
            token,
        )
        .await?;

        Ok(LastfmApiSession {
            username: session.name,
            key: session.key,
        })
    }

    async fn username(&self, session_key: &str) -> Result<String> {
        let user = client::get_user_info(
            &self.client,
            &self.credentials.api_key,
            &self.credentials.api_secret,
            session_key,
        )
        .await?;
        Ok(user.name)
    }

    async fn loved_tracks(
        &self,
        user: &str,
        limit: u32,
        page: u32,
    ) -> Result<Vec<LastfmApiTrack>> {
        let tracks =
            client::get_loved_tracks(&self.client, &self.credentials.api_key, user, limit, page)
                .await?;
        Ok(tracks
            .into_iter()
            .map(|track| LastfmApiTrack {
                artist: track.artist,
                name: track.name,
            })
            .collect())
    }

    async fn love_track(&self, session_key: &str, artist: &str, track: &str) -> Result<()> {
        client::love_track(
            &self.client,
            &self.credentials.api_key,
            &self.credentials.api_secret,
            session_key,
            artist,
            track,
        )
        .await
    }
}
