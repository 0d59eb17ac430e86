use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;

use crate::spotify_rs::types::SpotifyTokenResponse;

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

pub const SPOTIFY_SCOPES: [&str; 5] = [
    "user-read-private",
    "user-library-read",
    "user-library-modify",
    "playlist-modify-public",
    "user-top-read",
];

fn basic_authorization(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

/// Build the consent URL the user opens to grant access
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&scope={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&SPOTIFY_SCOPES.join(" "))
    )
}

/// Why the token endpoint did not hand out a token
#[derive(Debug, thiserror::Error)]
pub enum TokenRequestError {
    #[error("Spotify rejected the request: {reason}")]
    Rejected { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeCodeForTokenError {
    #[error("Invalid code")]
    InvalidCode(#[source] TokenRequestError),
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token")]
    InvalidRefreshToken(#[source] TokenRequestError),
}

/// POST a grant to the token endpoint, authenticating the app with HTTP Basic
async fn request_token(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    params: &[(&str, &str)],
) -> Result<SpotifyTokenResponse, TokenRequestError> {
    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // Serializes to x-www-form-urlencoded and sets the header, as the endpoint requires
        .form(params)
        .header(
            "Authorization",
            basic_authorization(client_id, client_secret),
        )
        .send()
        .await
        .map_err(TokenRequestError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(TokenRequestError::Rejected {
            reason: response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(TokenRequestError::FailedToParseResponse)
}

/// Exchange an authorization code for an access token
pub async fn exchange_code_for_token(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
    // Must be the exact redirect URI the consent URL was built with
    redirect_uri: &str,
) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
    request_token(
        client,
        client_id,
        client_secret,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await
    .map_err(ExchangeCodeForTokenError::InvalidCode)
}

/// Trade a refresh token for a fresh access token
pub async fn refresh_access_token(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    request_token(
        client,
        client_id,
        client_secret,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await
    .map_err(RefreshTokenError::InvalidRefreshToken)
}
