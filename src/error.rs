/*!
 * Error types for psbridge
 */

use psbridge_dispatch::DispatchError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AutomationError>;

/// Exit code constants for the command-line tool
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

/// Errors surfaced by wrappers
///
/// Protocol-level [`DispatchError`]s are converted into one of these at the wrapper
/// boundary; the raw protocol error is never returned to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutomationError {
    /// No viable remote handle could be resolved for an object class
    #[error("Unable to connect to {object_class}: tried {}", tried_list(.tried))]
    Connection {
        object_class: String,
        tried: Vec<String>,
    },

    /// A name-keyed lookup failed against a live collection
    #[error("No {kind} named '{name}' found in this collection")]
    NotFound { kind: &'static str, name: String },

    /// A position-keyed lookup fell outside the live bounds of a collection
    #[error("Index [{index}] is outside the range of this {kind} collection")]
    Index { kind: &'static str, index: i64 },

    /// The remote object rejected an access or operation
    #[error("Operation '{member}' failed: {diagnostic}")]
    Operation { member: String, diagnostic: String },

    /// Configuration or logging setup error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn tried_list(tried: &[String]) -> String {
    if tried.is_empty() {
        "nothing".to_string()
    } else {
        tried.join(", ")
    }
}

impl AutomationError {
    /// Convert a protocol failure raised while accessing `member`
    pub fn operation(member: &str, err: DispatchError) -> Self {
        AutomationError::Operation {
            member: member.to_string(),
            diagnostic: err.to_string(),
        }
    }

    /// Check if this error is fatal to the wrapper that raised it
    pub fn is_fatal(&self) -> bool {
        match self {
            AutomationError::Connection { .. } => true,
            AutomationError::Config(_) => true,

            AutomationError::NotFound { .. } => false,
            AutomationError::Index { .. } => false,
            AutomationError::Operation { .. } => false,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            EXIT_FATAL
        } else {
            EXIT_FAILURE
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            AutomationError::Connection { .. } => ErrorCategory::Connection,
            AutomationError::NotFound { .. } | AutomationError::Index { .. } => {
                ErrorCategory::Lookup
            }
            AutomationError::Operation { .. } => ErrorCategory::Remote,
            AutomationError::Config(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resolving a handle to the host application
    Connection,
    /// Collection lookups by name or position
    Lookup,
    /// Failures reported by the remote object
    Remote,
    /// Configuration errors
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Connection => write!(f, "connection"),
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Remote => write!(f, "remote"),
            ErrorCategory::Configuration => write!(f, "configuration"),
        }
    }
}

impl From<serde_json::Error> for AutomationError {
    fn from(err: serde_json::Error) -> Self {
        AutomationError::Config(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(AutomationError::Connection {
            object_class: "Application".to_string(),
            tried: vec![],
        }
        .is_fatal());
        assert!(AutomationError::Config("bad".to_string()).is_fatal());
        assert_eq!(
            AutomationError::Config("bad".to_string()).exit_code(),
            EXIT_FATAL
        );
    }

    #[test]
    fn test_non_fatal_errors() {
        assert!(!AutomationError::Index {
            kind: "layer",
            index: 4
        }
        .is_fatal());
        assert!(!AutomationError::NotFound {
            kind: "layer",
            name: "x".to_string()
        }
        .is_fatal());
        assert_eq!(
            AutomationError::Index {
                kind: "layer",
                index: 4
            }
            .exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_index_message_embeds_index() {
        let err = AutomationError::Index {
            kind: "layer",
            index: -3,
        };
        assert_eq!(
            err.to_string(),
            "Index [-3] is outside the range of this layer collection"
        );
    }

    #[test]
    fn test_connection_message_lists_candidates() {
        let err = AutomationError::Connection {
            object_class: "Application".to_string(),
            tried: vec![
                "Photoshop.Application.180".to_string(),
                "Photoshop.Application".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Unable to connect to Application: tried Photoshop.Application.180, Photoshop.Application"
        );
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_operation_keeps_diagnostic() {
        let err = AutomationError::operation(
            "applyGaussianBlur",
            DispatchError::invocation("General Photoshop error occurred"),
        );
        assert!(err.to_string().contains("General Photoshop error occurred"));
        assert_eq!(err.category(), ErrorCategory::Remote);
    }
}
