use color_eyre::eyre::{Result, eyre};
use serde::Deserialize;
use serde_json::Value;

/// Body of an `auth.getSession` response
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmSessionResponse {
    pub session: LastfmSession,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastfmSession {
    pub name: String,
    pub key: String,
}

/// Body of a `user.getInfo` response
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmUserResponse {
    pub user: LastfmUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastfmUser {
    pub name: String,
}

/// Error body returned by every method, sometimes with a 200 status
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmErrorResponse {
    pub error: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastfmLovedTrack {
    pub artist: String,
    pub name: String,
}

/// Last.fm collapses a list of one element into a bare object.
fn array_or_single(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

fn parse_loved_track(track: &Value) -> Option<LastfmLovedTrack> {
    let name = track.get("name")?.as_str()?.to_string();
    // Artist is an object in JSON responses, plain text in some older ones.
    let artist = match track.get("artist")? {
        Value::String(name) => name.clone(),
        artist => artist.get("name")?.as_str()?.to_string(),
    };
    Some(LastfmLovedTrack { artist, name })
}

/// Tracks of a `user.getLovedTracks` response. An unreadable entry fails the whole page, since a
/// shortened page would end a continuous walk early.
pub fn parse_loved_tracks(payload: &Value) -> Result<Vec<LastfmLovedTrack>> {
    array_or_single(
        payload
            .get("lovedtracks")
            .and_then(|value| value.get("track")),
    )
    .into_iter()
    .enumerate()
    .map(|(index, track)| {
        parse_loved_track(track)
            .ok_or_else(|| eyre!("Unreadable loved track at position {}: {}", index, track))
    })
    .collect()
}
