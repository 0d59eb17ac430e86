pub mod lastfm;
pub mod spotify;
