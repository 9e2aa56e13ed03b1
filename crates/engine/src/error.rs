use std::fmt;

/// Errors from reconciliation configuration or input loading.
///
/// Per-row problems (lookup misses, unparseable amounts, field collisions)
/// are recovered with a warning and never surface here.
#[derive(Debug)]
pub enum ReconcileError {
    /// TOML parse error in the config file.
    ConfigParse(String),
    /// Config parsed but failed validation.
    ConfigValidation(String),
    /// A funder was requested that the config does not define.
    UnknownFunder(String),
    /// A required column is missing from an input file's header.
    MissingColumn { source: String, column: String },
    /// Error reading input data.
    Io(String),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            ReconcileError::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            ReconcileError::UnknownFunder(name) => {
                write!(f, "funder '{name}' is not defined in the config")
            }
            ReconcileError::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            ReconcileError::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for ReconcileError {}
