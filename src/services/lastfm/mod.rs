pub mod client;

use chrono::{DateTime, Utc};

use crate::domain::{Service, Track};
use crate::error::ServiceError;
use crate::ports::lastfm::LastfmApi;
use crate::secrets::Secrets;
use crate::session::OAuthToken;
use client::{LastfmApiCredentials, LastfmHttpAdapter};

pub const NAME: &str = "Last.fm";

const SESSION_TOKEN_TYPE: &str = "session";

/// Last.fm sessions never expire, they are stored with the latest expiry RFC3339 can express.
fn session_expiry() -> DateTime<Utc> {
    // 9999-12-31T23:59:59Z
    DateTime::from_timestamp(253_402_300_799, 0).unwrap_or_default()
}

pub struct Lastfm {
    api: Box<dyn LastfmApi>,
    session: Option<OAuthToken>,
    username: Option<String>,
    secrets: Box<dyn Secrets>,
}

impl Lastfm {
    pub fn from_env(secrets: Box<dyn Secrets>) -> Result<Self, ServiceError> {
        let credentials = LastfmApiCredentials::from_env()?;
        Ok(Self::new(Box::new(LastfmHttpAdapter::new(credentials)), secrets))
    }

    pub fn new(api: Box<dyn LastfmApi>, secrets: Box<dyn Secrets>) -> Self {
        let session = OAuthToken::restore(secrets.as_ref())
            .filter(|token| !token.access_token.is_empty());

        Self {
            api,
            session,
            username: None,
            secrets,
        }
    }

    fn session_key(&self) -> Result<String, ServiceError> {
        self.session
            .as_ref()
            .map(|session| session.access_token.clone())
            .ok_or_else(|| ServiceError::NotAuthenticated(NAME.to_string()))
    }
}

#[async_trait::async_trait]
impl Service for Lastfm {
    fn name(&self) -> &'static str {
        NAME
    }

    fn authenticated(&self) -> bool {
        self.session.is_some()
    }

    fn create_auth_url(&self, redirect_url: &str) -> String {
        self.api.auth_url(redirect_url)
    }

    fn code_param(&self) -> &'static str {
        "token"
    }

    async fn authenticate(&mut self, code: &str, _redirect_url: &str) -> Result<(), ServiceError> {
        let session = self
            .api
            .session(code)
            .await
            .map_err(|error| ServiceError::authentication(NAME, error))?;

        self.session = Some(OAuthToken {
            token_type: SESSION_TOKEN_TYPE.to_string(),
            access_token: session.key,
            expiry: session_expiry(),
            refresh_token: String::new(),
        });
        self.username = Some(session.username);
        Ok(())
    }

    async fn username(&mut self) -> Result<String, ServiceError> {
        if let Some(username) = &self.username {
            return Ok(username.clone());
        }

        let session_key = self.session_key()?;
        let username = self
            .api
            .username(&session_key)
            .await
            .map_err(|error| ServiceError::ProfileRead {
                service: NAME,
                source: error.into(),
            })?;

        self.username = Some(username.clone());
        Ok(username)
    }

    async fn loved_tracks(&mut self, limit: u32, page: u32) -> Result<Vec<Track>, ServiceError> {
        let user = self.username().await.map_err(|error| match error {
            ServiceError::ProfileRead { source, .. } => ServiceError::TrackFetch {
                service: NAME,
                source,
            },
            other => other,
        })?;
        let tracks = self
            .api
            .loved_tracks(&user, limit, page)
            .await
            .map_err(|error| ServiceError::TrackFetch {
                service: NAME,
                source: error.into(),
            })?;

        Ok(tracks
            .into_iter()
            .map(|track| Track {
                artist: track.artist,
                name: track.name,
            })
            .collect())
    }

    async fn love_track(&mut self, track: &Track) -> Result<(), ServiceError> {
        let session_key = self.session_key()?;
        self.api
            .love_track(&session_key, &track.artist, &track.name)
            .await
            .map_err(|error| ServiceError::TrackLove {
                service: NAME,
                source: error.into(),
            })
    }

    async fn close(&mut self) -> Result<(), ServiceError> {
        let Some(session) = &self.session else {
            return Ok(());
        };

        session
            .persist(self.secrets.as_mut())
            .map_err(|error| ServiceError::TokenPersistence {
                service: NAME,
                source: error.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::lastfm::{LastfmApiSession, LastfmApiTrack, MockLastfmApi};
    use crate::session::{ACCESS_TOKEN, EXPIRY, REFRESH_TOKEN, TOKEN_TYPE};
    use crate::test_utils::{MemorySecrets, track};
    use color_eyre::eyre::eyre;

    fn stored_session() -> MemorySecrets {
        MemorySecrets::with_values(&[
            (TOKEN_TYPE, "session"),
            (ACCESS_TOKEN, "session-key"),
            (EXPIRY, "9999-12-31T23:59:59Z"),
            (REFRESH_TOKEN, ""),
        ])
    }

    #[test]
    fn test_restores_session() {
        let lastfm = Lastfm::new(Box::new(MockLastfmApi::new()), Box::new(stored_session()));

        assert!(lastfm.authenticated());
        assert_eq!(lastfm.name(), "Last.fm");
        assert_eq!(lastfm.code_param(), "token");
    }

    #[test]
    fn test_not_authenticated_without_session_key() {
        let secrets = MemorySecrets::with_values(&[
            (TOKEN_TYPE, "session"),
            (EXPIRY, "9999-12-31T23:59:59Z"),
        ]);
        let lastfm = Lastfm::new(Box::new(MockLastfmApi::new()), Box::new(secrets));

        assert!(!lastfm.authenticated());
    }

    #[tokio::test]
    async fn test_authenticate_then_close_persists_session() {
        let secrets = MemorySecrets::default();
        let mut api = MockLastfmApi::new();
        api.expect_session()
            .withf(|token| token.to_string() == "callback-token")
            .times(1)
            .returning(|_| {
                Ok(LastfmApiSession {
                    username: "joe".into(),
                    key: "new-key".into(),
                })
            });
        api.expect_username().never();

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(secrets.clone()));
        lastfm
            .authenticate("callback-token", "http://localhost:8080/callback")
            .await
            .unwrap();

        assert_eq!(lastfm.username().await.unwrap(), "joe");
        lastfm.close().await.unwrap();

        assert_eq!(secrets.value(TOKEN_TYPE).as_deref(), Some("session"));
        assert_eq!(secrets.value(ACCESS_TOKEN).as_deref(), Some("new-key"));
        assert_eq!(secrets.value(EXPIRY).as_deref(), Some("9999-12-31T23:59:59Z"));
        assert_eq!(secrets.value(REFRESH_TOKEN).as_deref(), Some(""));
        assert_eq!(secrets.save_count(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_failure() {
        let mut api = MockLastfmApi::new();
        api.expect_session()
            .returning(|_| Err(eyre!("error 4: Invalid authentication token")));

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(MemorySecrets::default()));
        let error = lastfm.authenticate("bad", "").await.unwrap_err();

        assert_eq!(error.to_string(), "failed to authenticate on Last.fm");
        assert!(!lastfm.authenticated());
    }

    #[tokio::test]
    async fn test_username_is_fetched_once() {
        let mut api = MockLastfmApi::new();
        api.expect_username()
            .withf(|key| key.to_string() == "session-key")
            .times(1)
            .returning(|_| Ok("joe".to_string()));

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(stored_session()));

        assert_eq!(lastfm.username().await.unwrap(), "joe");
        assert_eq!(lastfm.username().await.unwrap(), "joe");
    }

    #[tokio::test]
    async fn test_loved_tracks_for_session_user() {
        let mut api = MockLastfmApi::new();
        api.expect_username().returning(|_| Ok("joe".to_string()));
        api.expect_loved_tracks()
            .withf(|user, limit, page| user.to_string() == "joe" && *limit == 10 && *page == 2)
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![LastfmApiTrack {
                    artist: "David Bowie".into(),
                    name: "Heroes".into(),
                }])
            });

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(stored_session()));

        let tracks = lastfm.loved_tracks(10, 2).await.unwrap();

        assert_eq!(tracks, vec![track("David Bowie", "Heroes")]);
    }

    #[tokio::test]
    async fn test_loved_tracks_failure() {
        let mut api = MockLastfmApi::new();
        api.expect_username().returning(|_| Ok("joe".to_string()));
        api.expect_loved_tracks()
            .returning(|_, _, _| Err(eyre!("error 6: User not found")));

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(stored_session()));
        let error = lastfm.loved_tracks(10, 1).await.unwrap_err();

        assert_eq!(error.to_string(), "failed to read Last.fm loved tracks");
    }

    #[tokio::test]
    async fn test_loved_tracks_username_failure_is_fetch_error() {
        let mut api = MockLastfmApi::new();
        api.expect_username()
            .returning(|_| Err(eyre!("error 9: Invalid session key")));
        api.expect_loved_tracks().never();

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(stored_session()));
        let error = lastfm.loved_tracks(10, 1).await.unwrap_err();

        assert!(matches!(error, ServiceError::TrackFetch { service: "Last.fm", .. }));
    }

    #[tokio::test]
    async fn test_love_track_uses_session_key() {
        let mut api = MockLastfmApi::new();
        api.expect_love_track()
            .withf(|key, artist, name| {
                key.to_string() == "session-key"
                    && artist.to_string() == "Foo Fighters"
                    && name.to_string() == "Everlong"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(stored_session()));

        lastfm
            .love_track(&track("Foo Fighters", "Everlong"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_love_track_requires_session() {
        let mut api = MockLastfmApi::new();
        api.expect_love_track().never();

        let mut lastfm = Lastfm::new(Box::new(api), Box::new(MemorySecrets::default()));
        let error = lastfm.love_track(&track("A", "B")).await.unwrap_err();

        assert_eq!(error.to_string(), "not logged in on Last.fm");
    }

    #[tokio::test]
    async fn test_close_without_session_writes_nothing() {
        let secrets = MemorySecrets::default();
        let mut lastfm = Lastfm::new(Box::new(MockLastfmApi::new()), Box::new(secrets.clone()));

        lastfm.close().await.unwrap();

        assert!(secrets.is_empty());
        assert_eq!(secrets.save_count(), 0);
    }

    #[test]
    fn test_session_expiry_round_trips_through_rfc3339() {
        assert_eq!(
            session_expiry().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "9999-12-31T23:59:59Z"
        );
    }
}
