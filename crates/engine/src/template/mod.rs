//! Expression resolution for workflow definitions.
//!
//! Step parameters and conditions use a Jinja2-style `{{ variable }}`
//! grammar rendered against the run context with minijinja.

mod jinja;

pub use jinja::{ExprResolver, Resolution};
