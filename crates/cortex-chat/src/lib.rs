pub mod config;
pub mod connection;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod providers;
pub mod sse;
