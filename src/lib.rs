pub mod accounts;
pub mod app;
pub mod auth;
pub mod config;
pub mod documents;
pub mod http;
pub mod logging;
pub mod privacy;
pub mod retention;
pub mod state;
