use thiserror::Error;

/// Errors from setting up or adjusting logging.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
	#[error("Invalid log level: {0}, expected one of trace, debug, info, warn, error")]
	InvalidLogLevel(String),

	#[error("Logger is not initialized")]
	NotInitialized,

	#[error("Logger is already initialized: {0}")]
	AlreadyInitialized(String),

	#[error("Failed to reload log level: {0}")]
	ReloadFailed(String),
}
