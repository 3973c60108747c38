pub mod config;
pub mod dictionary;
pub mod error;
pub mod handlers;
pub mod lobby;
pub mod models;
pub mod render;
pub mod store;
