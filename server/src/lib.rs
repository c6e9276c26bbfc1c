pub mod config;
pub mod connection;
pub mod handlers;
pub mod registry;
pub mod server;
