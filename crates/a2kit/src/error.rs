//! Error types for Apache unit reconciliation.
//!
//! Errors are split between reconciliation problems (an unknown name, a
//! tool that refused a change) and infrastructure problems (a tool that
//! could not be started, a query result we do not understand). Callers
//! use the category to pick an exit status and advice.

use crate::types::{Action, ItemKind, ToolOutput};
use thiserror::Error;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Name is not a recognized unit of its kind
    UnknownItem,
    /// Enable/disable command ran and exited nonzero
    ToolFailure,
    /// External command could not be started or answered unexpectedly
    Launch,
    /// Request parameters are malformed
    InvalidRequest,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether the error is an environment problem rather than a state problem.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Launch)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownItem => "Unknown item",
            Self::ToolFailure => "Tool reported failure",
            Self::Launch => "Apache tools unavailable",
            Self::InvalidRequest => "Invalid request",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::UnknownItem => "Check the name against `a2query` output or install the unit",
            Self::ToolFailure => "Inspect stderr of the failed command; dependencies may conflict",
            Self::Launch => "Install the apache2 package or point the config at the tools",
            Self::InvalidRequest => "Fix the item, name and state parameters",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while reconciling Apache units.
#[derive(Debug, Error)]
pub enum Error {
    /// The query tool reports the name as unknown
    #[error("{} {name} is unknown", .kind.label())]
    UnknownItem {
        /// Kind the name was looked up in
        kind: ItemKind,
        /// Offending name
        name: String,
        /// Output of the query command
        output: ToolOutput,
    },

    /// An enable/disable command exited nonzero
    #[error(
        "failed to {action} {} {name}: `{}` exited with {}",
        .kind.label(),
        .output.command,
        .output.rc
    )]
    ToolFailed {
        /// Kind of the name
        kind: ItemKind,
        /// Name being changed
        name: String,
        /// Attempted action
        action: Action,
        /// Output of the failed command
        output: ToolOutput,
    },

    /// The external executable could not be started
    #[error("could not launch `{program}`: {source}")]
    Launch {
        /// Program that was spawned
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The query tool answered with an exit code/stderr we do not recognize
    #[error(
        "unexpected answer from `{}` (exit code {}): {}",
        .output.command,
        .output.rc,
        .output.stderr.trim()
    )]
    QueryFailed {
        /// Kind being queried
        kind: ItemKind,
        /// Output of the query command
        output: ToolOutput,
    },

    /// Malformed request parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownItem { .. } => ErrorCategory::UnknownItem,
            Error::ToolFailed { .. } => ErrorCategory::ToolFailure,
            Error::Launch { .. } | Error::QueryFailed { .. } => ErrorCategory::Launch,
            Error::InvalidRequest(_) | Error::Json(_) => ErrorCategory::InvalidRequest,
        }
    }

    /// Whether this is an infrastructure problem.
    pub fn is_infrastructure(&self) -> bool {
        self.category().is_infrastructure()
    }

    /// Output of the command that triggered the error, if any.
    pub fn output(&self) -> Option<&ToolOutput> {
        match self {
            Error::UnknownItem { output, .. }
            | Error::ToolFailed { output, .. }
            | Error::QueryFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Name the error is about, if any.
    pub fn item_name(&self) -> Option<&str> {
        match self {
            Error::UnknownItem { name, .. } | Error::ToolFailed { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
