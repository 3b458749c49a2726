pub mod chat_config;
pub mod curation;
pub mod health;
pub mod orgs;
