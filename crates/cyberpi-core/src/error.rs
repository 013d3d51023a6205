//! Error types for the vehicle session boundary and the supervisory loop

use std::fmt;

use thiserror::Error;

/// Errors returned by a [`VehicleSessionProvider`](crate::provider::VehicleSessionProvider)
/// while establishing a session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The configured vehicle could not be found with the given identity/key.
    /// Indicates a configuration error, never retried.
    #[error("Vehicle not found: {0}")]
    NotFound(String),

    /// The vehicle exists but could not be reached right now (out of range,
    /// connect timed out). Retried after backoff.
    #[error("Vehicle unavailable: {0}")]
    Unavailable(String),

    /// Unexpected provider failure
    #[error("Fatal connect error: {0}")]
    Fatal(String),
}

/// Errors returned by [`VehicleSession::poll_state`](crate::provider::VehicleSession::poll_state)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The provider's own request timeout elapsed
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Authentication tag or signature of a received message did not verify
    #[error("Invalid tag or signature: {0}")]
    TagOrSignature(String),

    /// The session's counter or token is stale or was rejected by the vehicle
    #[error("Invalid token or counter: {0}")]
    AuthOrCounter(String),

    /// Anything the provider could not categorise
    #[error("Fatal poll error: {0}")]
    Fatal(String),
}

impl PollError {
    /// Map a poll failure onto the class that drives the reconnect policy
    pub fn classify(&self) -> FailureClass {
        match self {
            PollError::Timeout(_) => FailureClass::Timeout,
            PollError::TagOrSignature(_) => FailureClass::TagOrSignatureFault,
            PollError::AuthOrCounter(_) => FailureClass::AuthOrCounterFault,
            PollError::Fatal(_) => FailureClass::Fatal,
        }
    }
}

/// Failure of a best-effort session teardown. Logged, never escalated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Disconnect failed: {0}")]
pub struct DisconnectError(pub String);

/// Classification of a poll failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    Timeout,
    AuthOrCounterFault,
    TagOrSignatureFault,
    Fatal,
}

impl FailureClass {
    /// Whether the supervisor may reconnect after this failure
    pub fn is_recoverable(self) -> bool {
        !matches!(self, FailureClass::Fatal)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureClass::Timeout => "timeout",
            FailureClass::AuthOrCounterFault => "auth/counter fault",
            FailureClass::TagOrSignatureFault => "tag/signature fault",
            FailureClass::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not determine home directory")]
    HomeDirUnavailable,
}

/// Terminal outcomes of the session lifecycle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Bad VIN or key path. The operator has to fix the configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected, unrecoverable provider failure
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Errors that stop the supervisor
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SupervisorError {
    /// Whether the failure was caused by operator configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SupervisorError::Config(_) | SupervisorError::Lifecycle(LifecycleError::Configuration(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_error_classification() {
        assert_eq!(
            PollError::Timeout("ble".into()).classify(),
            FailureClass::Timeout
        );
        assert_eq!(
            PollError::TagOrSignature("aes-gcm".into()).classify(),
            FailureClass::TagOrSignatureFault
        );
        assert_eq!(
            PollError::AuthOrCounter("counter".into()).classify(),
            FailureClass::AuthOrCounterFault
        );
        assert_eq!(
            PollError::Fatal("boom".into()).classify(),
            FailureClass::Fatal
        );
    }

    #[test]
    fn test_only_fatal_is_unrecoverable() {
        assert!(FailureClass::Timeout.is_recoverable());
        assert!(FailureClass::AuthOrCounterFault.is_recoverable());
        assert!(FailureClass::TagOrSignatureFault.is_recoverable());
        assert!(!FailureClass::Fatal.is_recoverable());
    }

    #[test]
    fn test_configuration_errors_are_flagged() {
        let err: SupervisorError = LifecycleError::Configuration("no vin".into()).into();
        assert!(err.is_configuration());

        let err: SupervisorError = LifecycleError::Fatal("boom".into()).into();
        assert!(!err.is_configuration());

        let err: SupervisorError = ConfigError::HomeDirUnavailable.into();
        assert!(err.is_configuration());
    }
}
