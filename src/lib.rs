pub mod config;
pub mod error;
pub mod history;
pub mod mastodon;
pub mod report;
pub mod stats;
