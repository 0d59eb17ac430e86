//! Thin bindings for the parts of the Spotify Web API this tool talks to.
//! https://developer.spotify.com/documentation/web-api

pub mod auth;
pub mod client;
pub mod types;
