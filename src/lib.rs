pub mod analysis_fetch;
pub mod config;
pub mod fake_feed;
pub mod feed;
pub mod http_client;
pub mod prefs;
pub mod state;
