use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::domain::{MockService, Track};
use crate::ports::spotify::{MockSpotifyApi, MockSpotifyAuthenticator};
use crate::secrets::{Secrets, SecretsError};
use crate::services::spotify::Spotify;
use crate::session::{ACCESS_TOKEN, EXPIRY, REFRESH_TOKEN, TOKEN_TYPE};

#[derive(Debug, Default)]
struct MemoryState {
    values: BTreeMap<String, String>,
    saves: usize,
    fail_save: bool,
}

/// In-memory secrets unit. Clones share state, so a test can keep a handle
/// after moving the unit into a service.
#[derive(Debug, Clone, Default)]
pub struct MemorySecrets {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySecrets {
    pub fn with_values(values: &[(&str, &str)]) -> Self {
        let secrets = Self::default();
        {
            let mut state = secrets.state.lock().unwrap();
            for (key, value) in values {
                state.values.insert(key.to_string(), value.to_string());
            }
        }
        secrets
    }

    pub fn failing_save(self) -> Self {
        self.state.lock().unwrap().fail_save = true;
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(key).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().saves
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().values.is_empty()
    }
}

impl Secrets for MemorySecrets {
    fn is_set(&self, key: &str) -> bool {
        self.state.lock().unwrap().values.contains_key(key)
    }

    fn get(&self, key: &str) -> String {
        self.value(key).unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(key.to_string(), value.to_string());
    }

    fn save(&mut self) -> Result<(), SecretsError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_save {
            return Err(SecretsError::Write {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        state.saves += 1;
        Ok(())
    }
}

pub fn track(artist: &str, name: &str) -> Track {
    Track {
        artist: artist.to_string(),
        name: name.to_string(),
    }
}

pub fn tracks(count: usize, prefix: &str) -> Vec<Track> {
    (0..count)
        .map(|index| track(&format!("{} Artist {}", prefix, index), &format!("Song {}", index)))
        .collect()
}

/// A mock service with a fixed name and authentication state that expects to be closed once.
pub fn mock_service(name: &'static str, authenticated: bool) -> MockService {
    let mut service = MockService::new();
    service.expect_name().return_const(name);
    service.expect_authenticated().return_const(authenticated);
    service.expect_close().times(1).returning(|| Ok(()));
    service
}

/// A Spotify service with a restored session served by `api`.
pub fn spotify_with(api: MockSpotifyApi) -> Spotify {
    let api = Mutex::new(Some(api));
    let mut authenticator = MockSpotifyAuthenticator::new();
    authenticator
        .expect_client()
        .returning(move |_| Box::new(api.lock().unwrap().take().unwrap()));
    let secrets = MemorySecrets::with_values(&[
        (TOKEN_TYPE, "Bearer"),
        (ACCESS_TOKEN, "access"),
        (EXPIRY, "2030-01-01T00:00:00Z"),
        (REFRESH_TOKEN, "refresh"),
    ]);
    Spotify::new(Box::new(authenticator), Box::new(secrets))
}
