use thiserror::Error;
use tracing::{error, warn};

/// Error severity for the debug overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable
    Error,    // operation failed
    Critical, // requires user action
}

/// Domain-specific errors for the notch panel app
#[derive(Error, Debug)]
pub enum NotchError {
    #[error("Task store error: {0}")]
    TaskStore(String),

    #[error("Failed to parse task data: {0}")]
    TaskParse(#[from] serde_json::Error),

    #[error("Task persistence failed for '{path}': {source}")]
    TaskPersist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey registration failed: {0}")]
    Hotkey(String),

    #[error("Tray setup failed: {0}")]
    Tray(String),

    #[error("Window operation failed: {0}")]
    Window(String),
}

impl NotchError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TaskStore(_) => ErrorSeverity::Error,
            Self::TaskParse(_) => ErrorSeverity::Warning,
            Self::TaskPersist { .. } => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Hotkey(_) => ErrorSeverity::Warning,
            Self::Tray(_) => ErrorSeverity::Warning,
            Self::Window(_) => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::TaskStore(msg) => msg.clone(),
            Self::TaskParse(e) => format!("Invalid task data: {}", e),
            Self::TaskPersist { path, .. } => format!("Could not save tasks to {}", path),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Hotkey(msg) => format!("Could not register hotkey: {}", msg),
            Self::Tray(msg) => format!("Tray unavailable: {}", msg),
            Self::Window(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotchError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

/// Panic in debug mode, log error in release mode.
///
/// Use for "impossible" states that should crash during development
/// but gracefully degrade in production.
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}
