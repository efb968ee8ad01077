//! Startup configuration and the request/response data model.

pub mod config;
pub mod models;
