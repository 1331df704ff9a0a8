//! Configuration module for the Opsflow Engine server.
//!
//! Configuration is loaded from environment variables using the `envy`
//! crate for type-safe parsing.

mod app;

pub use app::AppConfig;
