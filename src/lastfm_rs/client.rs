use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::lastfm_rs::types::{
    LastfmErrorResponse, LastfmLovedTrack, LastfmSession, LastfmSessionResponse, LastfmUser,
    LastfmUserResponse, parse_loved_tracks,
};

const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";
const AUTH_URL: &str = "https://www.last.fm/api/auth/";

/// Build the consent URL the user opens to grant access
/// https://www.last.fm/api/webauth
pub fn auth_url(api_key: &str, redirect_url: &str) -> String {
    format!(
        "{}?api_key={}&cb={}",
        AUTH_URL,
        urlencoding::encode(api_key),
        urlencoding::encode(redirect_url)
    )
}

/// `api_sig` of a call: md5 over the parameters sorted by name, concatenated as name and value,
/// followed by the shared secret.
pub fn api_signature(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|left, right| left.0.cmp(right.0));

    let mut raw: String = sorted
        .into_iter()
        .map(|(key, value)| format!("{}{}", key, value))
        .collect();
    raw.push_str(api_secret);

    format!("{:x}", md5::compute(raw))
}

/// Parameters of a signed call. `format` is added after signing since it is not part of the
/// signature.
fn signed_params(
    method: &str,
    api_key: &str,
    api_secret: &str,
    params: &[(&str, &str)],
) -> Vec<(String, String)> {
    let mut all = vec![("method", method), ("api_key", api_key)];
    all.extend_from_slice(params);
    let signature = api_signature(&all, api_secret);

    let mut query: Vec<(String, String)> = all
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    query.push(("api_sig".to_string(), signature));
    query.push(("format".to_string(), "json".to_string()));
    query
}

async fn send(request: RequestBuilder, method: &str) -> Result<Value> {
    let response = request
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .wrap_err_with(|| format!("Failed to request {}", method))?;
    let status = response.status();

    let payload: Value = response
        .json()
        .await
        .wrap_err_with(|| format!("Failed to parse {} response", method))?;

    if payload.get("error").is_some() {
        let error: LastfmErrorResponse = serde_json::from_value(payload)
            .wrap_err_with(|| format!("Failed to parse {} error", method))?;
        bail!("{} failed with error {}: {}", method, error.error, error.message);
    }
    if !status.is_success() {
        bail!("{} failed with status {}", method, status);
    }

    Ok(payload)
}

/// Exchange the token from the auth callback for a session that never expires
pub async fn get_session(
    client: &Client,
    api_key: &str,
    api_secret: &str,
    token: &str,
) -> Result<LastfmSession> {
    let params = signed_params("auth.getSession", api_key, api_secret, &[("token", token)]);
    let payload = send(client.get(API_URL).query(&params), "auth.getSession").await?;
    let response: LastfmSessionResponse =
        serde_json::from_value(payload).wrap_err("Failed to parse Last.fm session")?;
    Ok(response.session)
}

/// Profile of the user owning the session
pub async fn get_user_info(
    client: &Client,
    api_key: &str,
    api_secret: &str,
    session_key: &str,
) -> Result<LastfmUser> {
    let params = signed_params("user.getInfo", api_key, api_secret, &[("sk", session_key)]);
    let payload = send(client.get(API_URL).query(&params), "user.getInfo").await?;
    let response: LastfmUserResponse =
        serde_json::from_value(payload).wrap_err("Failed to parse Last.fm user")?;
    Ok(response.user)
}

/// One page of a user's loved tracks. Pages start at 1.
pub async fn get_loved_tracks(
    client: &Client,
    api_key: &str,
    user: &str,
    limit: u32,
    page: u32,
) -> Result<Vec<LastfmLovedTrack>> {
    let limit = limit.to_string();
    let page = page.to_string();
    let request = client.get(API_URL).query(&[
        ("method", "user.getLovedTracks"),
        ("api_key", api_key),
        ("user", user),
        ("limit", limit.as_str()),
        ("page", page.as_str()),
        ("format", "json"),
    ]);
    let payload = send(request, "user.getLovedTracks").await?;
    parse_loved_tracks(&payload).wrap_err("Failed to read user.getLovedTracks response")
}

pub async fn love_track(
    client: &Client,
    api_key: &str,
    api_secret: &str,
    session_key: &str,
    artist: &str,
    track: &str,
) -> Result<()> {
    let params = signed_params(
        "track.love",
        api_key,
        api_secret,
        &[("artist", artist), ("track", track), ("sk", session_key)],
    );
    send(client.post(API_URL).form(&params), "track.love").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_signature_sorts_parameters() {
        let signature = api_signature(
            &[
                ("token", "tok"),
                ("method", "auth.getSession"),
                ("api_key", "key"),
            ],
            "secret",
        );

        assert_eq!(signature, "04e870be4bb79756721b7bc1937fe83d");
    }

    #[test]
    fn test_signed_params_leaves_format_unsigned() {
        let params = signed_params("auth.getSession", "key", "secret", &[("token", "tok")]);

        assert_eq!(
            params,
            vec![
                ("method".to_string(), "auth.getSession".to_string()),
                ("api_key".to_string(), "key".to_string()),
                ("token".to_string(), "tok".to_string()),
                (
                    "api_sig".to_string(),
                    "04e870be4bb79756721b7bc1937fe83d".to_string()
                ),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_auth_url() {
        let url = auth_url("my key", "http://localhost:8080/callback");
        assert_eq!(
            url,
            "https://www.last.fm/api/auth/?api_key=my%20key&cb=http%3A%2F%2Flocalhost%3A8080%2Fcallback"
        );
    }
}
