//! HTTP API handlers.

pub mod classify;
pub mod health;
pub mod runs;
pub mod workflows;

pub use health::health_check;
