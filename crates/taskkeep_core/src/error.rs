use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("not_found - {0}")]
    NotFound(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("io_error - {0}")]
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::NotFound(message)
            | Self::InvalidData(message)
            | Self::Io(message) => message,
        }
    }

    /// True for faults raised by the storage adapter or by decoding what it
    /// returned, as opposed to problems with the caller's input.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::InvalidData(_) | Self::Io(_))
    }
}
