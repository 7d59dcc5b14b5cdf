//! AI tool execution: provider key resolution, prompt assembly, structured
//! generation calls, and result persistence.
//!
//! # Modules
//!
//! - [`client`]: HTTP client for the three provider APIs, all asked for a
//!   structured JSON object
//! - [`prompts`]: Prompt assembly for the four tools
//! - [`tools`]: The tool runner tying key lookup, generation, content storage,
//!   and activity logging together

pub mod client;
pub mod prompts;
pub mod tools;

use crate::api::models::provider_keys::Provider;
use crate::errors::Error;
use thiserror::Error as ThisError;

/// Typed failures of a tool invocation.
///
/// The first three surface *before* any provider HTTP call is made.
#[derive(ThisError, Debug)]
pub enum ToolError {
    /// The organization has no key at all for the requested provider
    #[error("no {provider} API key is configured for this organization")]
    KeyMissing { provider: Provider },

    /// A key exists but none is active
    #[error("the {provider} API key for this organization is inactive")]
    KeyInactive { provider: Provider },

    /// The stored key decrypts to an empty string
    #[error("the {provider} API key for this organization is empty")]
    KeyEmpty { provider: Provider },

    /// The provider call itself failed (non-success status, transport error, timeout)
    #[error("{provider} request failed: {message}")]
    Upstream { provider: Provider, message: String },

    /// The provider answered, but not with the requested JSON shape
    #[error("{provider} returned malformed structured output: {message}")]
    MalformedOutput { provider: Provider, message: String },
}

impl ToolError {
    /// Short machine-readable code recorded in the activity log
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::KeyMissing { .. } => "key_missing",
            ToolError::KeyInactive { .. } => "key_inactive",
            ToolError::KeyEmpty { .. } => "key_empty",
            ToolError::Upstream { .. } => "upstream_failed",
            ToolError::MalformedOutput { .. } => "malformed_output",
        }
    }
}

impl From<ToolError> for Error {
    fn from(err: ToolError) -> Self {
        match &err {
            ToolError::KeyMissing { .. } | ToolError::KeyInactive { .. } | ToolError::KeyEmpty { .. } => Error::BadRequest {
                message: err.to_string(),
            },
            ToolError::Upstream { provider, message } | ToolError::MalformedOutput { provider, message } => Error::Upstream {
                service: provider.to_string(),
                message: message.clone(),
            },
        }
    }
}
