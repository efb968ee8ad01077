//! HTTP surface consumed by the browser extension.

pub mod handler;
pub mod helpers;

pub use handler::{ApiState, router, serve};
