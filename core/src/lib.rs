pub mod auth;
pub mod config;
pub mod curation;
pub mod error;
