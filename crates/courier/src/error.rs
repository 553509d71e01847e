use thiserror::Error;

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, CourierError>;

/// Errors that can occur in the message exchange core
#[derive(Error, Debug)]
pub enum CourierError {
    /// Malformed topic key
    #[error("Topic error: {message}")]
    Topic { message: String },

    /// Malformed topic pattern
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Message failed its own validation contract
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Downstream sink failed to accept a message
    #[error("Sink error: {message}")]
    Sink { message: String },

    /// Serialization errors from a message formatter
    #[error("Format error: {message}")]
    Format { message: String },

    /// Generic errors from other sources
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl CourierError {
    /// Create a new topic error
    pub fn topic(message: impl Into<String>) -> Self {
        Self::Topic {
            message: message.into(),
        }
    }

    /// Create a new pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a new format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Topic { .. } => "topic",
            Self::Pattern { .. } => "pattern",
            Self::Validation { .. } => "validation",
            Self::Sink { .. } => "sink",
            Self::Format { .. } => "format",
            Self::External { .. } => "external",
        }
    }

    /// Check whether the error is a caller mistake rather than a runtime fault
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::Topic { .. } | Self::Pattern { .. })
    }
}
