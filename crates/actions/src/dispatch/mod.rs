//! Dispatcher implementations, one per action kind.

mod api_call;
mod approval;
mod notify;
mod task;
mod ticket;

pub use api_call::{ApiCallConfig, ApiCallDispatcher, HttpMethod};
pub use approval::ApprovalDispatcher;
pub use notify::NotifyDispatcher;
pub use task::TaskDispatcher;
pub use ticket::TicketDispatcher;

use crate::error::ActionError;
use crate::Record;

/// Read a required string parameter. Blank values count as missing so
/// that an unresolved template placeholder cannot satisfy a requirement.
pub(crate) fn str_param<'a>(params: &'a Record, key: &str) -> Result<&'a str, ActionError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ActionError::Configuration(format!("Missing required parameter: {}", key)))
}

/// Read an optional string parameter with a default.
pub(crate) fn str_param_or<'a>(params: &'a Record, key: &str, default: &'a str) -> &'a str {
    params.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}
