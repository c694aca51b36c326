use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("Config relay did not answer within {0:?}")]
    RelayTimeout(Duration),

    #[error("Failed to load native library {name}: {message}")]
    LibraryLoadFailed { name: String, message: String },

    #[error("Native symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Native call {call} returned {code}")]
    NativeCallFailed { call: &'static str, code: i32 },

    #[error("Native call {0} panicked")]
    NativeCallPanicked(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Whether the error means the relay could not be reached at all,
    /// as opposed to a malformed answer.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::RelayUnavailable(_) | Error::RelayTimeout(_)) || self.is_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_error_is_unreachable() {
        assert!(Error::RelayTimeout(Duration::from_secs(3)).is_unreachable());
        assert!(Error::RelayUnavailable("refused".to_string()).is_unreachable());
        assert!(!Error::SymbolNotFound("rvahook_native_init".to_string()).is_unreachable());
    }

    #[test]
    fn test_native_call_failed_message() {
        let err = Error::NativeCallFailed {
            call: "rvahook_native_init",
            code: -1,
        };
        assert_eq!(err.to_string(), "Native call rvahook_native_init returned -1");
    }

    #[test]
    fn test_native_call_panicked_message() {
        let err = Error::NativeCallPanicked("update_targets");
        assert_eq!(err.to_string(), "Native call update_targets panicked");
    }
}
