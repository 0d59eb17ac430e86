pub mod client;
pub mod playlists;

use color_eyre::eyre::WrapErr;

use crate::domain::{Service, Track};
use crate::error::ServiceError;
use crate::ports::spotify::{SpotifyApi, SpotifyApiTrack, SpotifyAuthenticator};
use crate::secrets::{Secrets, SecretsLoader};
use crate::services::secrets_name;
use crate::session::OAuthToken;
use client::{SpotifyApiCredentials, SpotifyHttpAuthenticator};

pub const NAME: &str = "Spotify";

pub struct Spotify {
    authenticator: Box<dyn SpotifyAuthenticator>,
    client: Option<Box<dyn SpotifyApi>>,
    secrets: Box<dyn Secrets>,
}

impl Spotify {
    /// Build the service with app credentials from the environment.
    pub fn from_env(secrets: Box<dyn Secrets>) -> Result<Self, ServiceError> {
        let credentials = SpotifyApiCredentials::from_env()?;
        Ok(Self::new(
            Box::new(SpotifyHttpAuthenticator::new(credentials)),
            secrets,
        ))
    }

    /// Build the service around its own secrets unit, for the Spotify-only commands.
    pub fn load(secrets_loader: &dyn SecretsLoader) -> Result<Self, ServiceError> {
        let name = secrets_name(NAME);
        let secrets = secrets_loader
            .load(&name)
            .map_err(|source| ServiceError::ConfigLoad { name, source })?;
        Self::from_env(secrets)
    }

    /// Build the service, restoring a previously persisted session if there is one.
    pub fn new(authenticator: Box<dyn SpotifyAuthenticator>, secrets: Box<dyn Secrets>) -> Self {
        let client = OAuthToken::restore(secrets.as_ref()).map(|token| {
            log::debug!("Restored Spotify session from secrets");
            authenticator.client(token)
        });

        Self {
            authenticator,
            client,
            secrets,
        }
    }

    fn client(&mut self) -> Result<&mut (dyn SpotifyApi + 'static), ServiceError> {
        self.client
            .as_deref_mut()
            .ok_or_else(|| ServiceError::NotAuthenticated(NAME.to_string()))
    }
}

/// Search query matching a track by artist and title. Quotes inside the values would end the
/// quoted field early, so they are dropped.
fn search_query(track: &Track) -> String {
    format!(
        "artist:\"{}\" track:\"{}\"",
        track.artist.replace('"', ""),
        track.name.replace('"', "")
    )
}

fn to_track(track: SpotifyApiTrack) -> Track {
    Track {
        artist: track.artists.into_iter().next().unwrap_or_default(),
        name: track.name,
    }
}

#[async_trait::async_trait]
impl Service for Spotify {
    fn name(&self) -> &'static str {
        NAME
    }

    fn authenticated(&self) -> bool {
        self.client.is_some()
    }

    fn create_auth_url(&self, redirect_url: &str) -> String {
        self.authenticator.auth_url(redirect_url)
    }

    fn code_param(&self) -> &'static str {
        "code"
    }

    async fn authenticate(&mut self, code: &str, redirect_url: &str) -> Result<(), ServiceError> {
        let token = self
            .authenticator
            .exchange(code, redirect_url)
            .await
            .map_err(|error| ServiceError::authentication(NAME, error))?;

        self.client = Some(self.authenticator.client(token));
        Ok(())
    }

    async fn username(&mut self) -> Result<String, ServiceError> {
        let user = self
            .client()?
            .current_user()
            .await
            .map_err(|error| ServiceError::ProfileRead {
                service: NAME,
                source: error.into(),
            })?;

        Ok(user.display_name.unwrap_or(user.id))
    }

    async fn loved_tracks(&mut self, limit: u32, page: u32) -> Result<Vec<Track>, ServiceError> {
        let client = self.client()?;
        let offset = page
            .saturating_sub(1)
            .checked_mul(limit)
            .ok_or_else(|| ServiceError::TrackFetch {
                service: NAME,
                source: format!("page {} of {} tracks is past the last offset", page, limit).into(),
            })?;
        let tracks = client
            .saved_tracks(limit, offset)
            .await
            .map_err(|error| ServiceError::TrackFetch {
                service: NAME,
                source: error.into(),
            })?;

        Ok(tracks.into_iter().map(to_track).collect())
    }

    async fn love_track(&mut self, track: &Track) -> Result<(), ServiceError> {
        let client = self.client()?;

        let results = client
            .search_tracks(&search_query(track), 1)
            .await
            .wrap_err("Failed to search track on Spotify")
            .map_err(|error| ServiceError::TrackLove {
                service: NAME,
                source: error.into(),
            })?;

        let Some(track_id) = results.into_iter().next().and_then(|found| found.id) else {
            log::info!("No Spotify match for {}", track);
            return Ok(());
        };

        client
            .save_tracks(&[track_id])
            .await
            .map_err(|error| ServiceError::TrackLove {
                service: NAME,
                source: error.into(),
            })
    }

    async fn close(&mut self) -> Result<(), ServiceError> {
        let Some(client) = self.client.as_deref() else {
            return Ok(());
        };

        let persistence_error = |source| ServiceError::TokenPersistence {
            service: NAME,
            source,
        };

        let token = client.token().map_err(|error| persistence_error(error.into()))?;
        token
            .persist(self.secrets.as_mut())
            .map_err(|error| persistence_error(error.into()))?;

        log::debug!("Persisted Spotify session");
        Ok(())
    }
}
