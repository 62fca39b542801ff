//! Error types for Colonnade

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Numeric error code shared with the cluster error taxonomy
    pub fn code(&self) -> u32 {
        match self {
            Error::Configuration(_) => 1003,
            Error::Io { .. } => 1010,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "Configuration Error",
            Error::Io { .. } => "Resource Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_code() {
        let err = Error::configuration("missing mode");
        assert_eq!(err.code(), 1003);
        assert_eq!(err.error_type(), "Configuration Error");
        assert_eq!(err.to_string(), "Configuration error: missing mode");
    }
}
