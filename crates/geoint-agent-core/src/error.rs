//! Typed failures that are surfaced to the user rather than propagated.
//!
//! None of these ever escape the dispatcher: action errors become a failed
//! [`ActionResult`](crate::state::ActionResult) on the assistant turn, client
//! errors become the fallback assistant message.

use thiserror::Error;

/// Why a single agent action could not be carried out
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("Unsupported action: {0}")]
    UnsupportedTool(String),

    #[error("{tool}: missing required parameter `{name}`")]
    MissingParameter { tool: &'static str, name: &'static str },

    #[error("{tool}: invalid parameter `{name}` ({reason})")]
    InvalidParameter {
        tool: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error("{tool}: the GEOINT workspace is not active")]
    FeatureInactive { tool: &'static str },

    #[error("{tool}: not available in the active workspace")]
    CapabilityMissing { tool: &'static str },

    #[error("{tool}: no keyword matches `{reference}`")]
    UnknownKeyword { tool: &'static str, reference: String },

    #[error("{tool} failed: {reason}")]
    Failed { tool: &'static str, reason: String },
}

/// Returned by a [`FeatureController`](crate::bridge::FeatureController) mutator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// The feature module does not expose this capability
    #[error("capability not supported")]
    Unsupported,

    #[error("{0}")]
    Rejected(String),
}

/// Failure talking to the remote agent endpoint
#[derive(Debug, Error)]
pub enum AgentClientError {
    #[error("agent request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("agent endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not decode agent response: {0}")]
    Decode(#[from] serde_json::Error),
}
