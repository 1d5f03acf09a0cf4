use gopher_shared::{ErrorCode, ErrorEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidConfig = 2,
    Io = 3,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }

    /// Envelope reported for a failure inside the CLI itself.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let code = match self {
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        };
        ErrorEnvelope::unexpected(ErrorCode::new("cli", code), self.to_string())
    }
}
