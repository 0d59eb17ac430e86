//! Thin bindings for the Last.fm web services used by the sync commands.
//! https://www.last.fm/api

pub mod client;
pub mod types;
