//! Script execution error types

use std::fmt;

/// Script execution result type
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Script execution error
#[derive(Debug, Clone)]
pub enum ScriptError {
    /// Script compilation/parsing error
    Compilation {
        /// Error message
        message: String,
        /// Line number if available
        line: Option<usize>,
        /// Column number if available
        column: Option<usize>,
    },

    /// Script runtime error
    Runtime {
        /// Error message
        message: String,
        /// Script line where error occurred
        line: Option<usize>,
    },

    /// Script timeout
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Invalid script source
    InvalidSource {
        /// Error message
        message: String,
    },

    /// IO error (reading bootstrap files)
    Io {
        /// Error message
        message: String,
    },
}

impl ScriptError {
    /// Create a compilation error
    pub fn compilation<S: Into<String>>(message: S) -> Self {
        Self::Compilation {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a runtime error
    pub fn runtime<S: Into<String>>(message: S) -> Self {
        Self::Runtime {
            message: message.into(),
            line: None,
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Create an invalid source error
    pub fn invalid_source<S: Into<String>>(message: S) -> Self {
        Self::InvalidSource {
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compilation {
                message,
                line,
                column,
            } => {
                write!(f, "Script compilation error: {}", message)?;
                if let Some(line) = line {
                    write!(f, " at line {}", line)?;
                    if let Some(col) = column {
                        write!(f, ", column {}", col)?;
                    }
                }
                Ok(())
            }
            Self::Runtime { message, line } => {
                write!(f, "Script runtime error: {}", message)?;
                if let Some(line) = line {
                    write!(f, " at line {}", line)?;
                }
                Ok(())
            }
            Self::Timeout { timeout_ms } => {
                write!(f, "Script timeout after {}ms", timeout_ms)
            }
            Self::InvalidSource { message } => {
                write!(f, "Invalid script source: {}", message)
            }
            Self::Io { message } => {
                write!(f, "Script IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<rhai::ParseError> for ScriptError {
    fn from(err: rhai::ParseError) -> Self {
        let pos = err.1;
        Self::Compilation {
            message: err.to_string(),
            line: pos.line(),
            column: pos.position(),
        }
    }
}

impl From<Box<rhai::EvalAltResult>> for ScriptError {
    fn from(err: Box<rhai::EvalAltResult>) -> Self {
        let pos = err.position();
        Self::Runtime {
            message: err.to_string(),
            line: pos.line(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compilation_error_display() {
        let err = ScriptError::Compilation {
            message: "unexpected end of input".to_string(),
            line: Some(1),
            column: Some(9),
        };
        assert_eq!(
            err.to_string(),
            "Script compilation error: unexpected end of input at line 1, column 9"
        );
    }

    #[test]
    fn test_runtime_error_without_position() {
        let err = ScriptError::runtime("variable not found");
        assert_eq!(err.to_string(), "Script runtime error: variable not found");
    }

    #[test]
    fn test_parse_error_conversion() {
        let engine = rhai::Engine::new();
        let err: ScriptError = engine.compile("respond(").unwrap_err().into();
        assert!(matches!(err, ScriptError::Compilation { .. }));
    }
}
