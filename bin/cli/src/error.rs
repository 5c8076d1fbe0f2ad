use std::fmt;

/// Errors that end a CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The request pipeline could not be assembled.
    Startup { details: String },
    /// The command ran and failed.
    Command { details: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "configuration error: {details}"),
            Self::Startup { details } => write!(f, "startup failed: {details}"),
            Self::Command { details } => write!(f, "{details}"),
        }
    }
}

impl std::error::Error for CliError {}
