/// Error type definitions
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FalconError {
    /// The operating environment could not supply secure randomness.
    #[error("Secure randomness unavailable: {0}")]
    EntropyUnavailable(String),

    /// A key buffer does not match the expected layout.
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// A signature buffer does not match the expected layout.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// The key decodes fine but is not a consistent Falcon key.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key generation did not converge after {attempts} attempts")]
    KeygenRetryExhausted { attempts: u32 },

    #[error("Signing did not converge after {attempts} attempts")]
    SigningRetryExhausted { attempts: u32 },

    #[error("Signature buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("Key not initialized: {0}")]
    MissingKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FalconError {
    /// Whether retrying the whole call with fresh randomness may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FalconError::KeygenRetryExhausted { .. } | FalconError::SigningRetryExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FalconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhaustion_is_transient() {
        assert!(FalconError::KeygenRetryExhausted { attempts: 3 }.is_transient());
        assert!(FalconError::SigningRetryExhausted { attempts: 3 }.is_transient());
        assert!(!FalconError::MalformedKey("short".to_string()).is_transient());
        assert!(!FalconError::EntropyUnavailable("os".to_string()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = FalconError::BufferTooSmall {
            required: 666,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "Signature buffer too small: need 666 bytes, got 10"
        );
    }
}
