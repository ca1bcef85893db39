use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, warn};

/// Error types for bus, sysfs and sensor operations
#[derive(Error, Debug)]
pub enum HalError {
    #[error("I2C transfer with device {address:#04x} failed: {reason}")]
    Bus { address: u8, reason: String },

    #[error("Bus '{bus}' not found or unavailable: {reason}")]
    BusNotFound { bus: String, reason: String },

    #[error("Access to '{}' failed: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown {kind} pin {pin}")]
    UnknownPin { kind: &'static str, pin: u8 },

    #[error("'{}' is not a known ADC channel", .path.display())]
    UnknownChannel { path: PathBuf },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("PWM pin {pin}: duty cycle written before any period")]
    PeriodNotConfigured { pin: u8 },

    #[error("PWM pin {pin}: duty cycle {duty_cycle} exceeds period {period}")]
    DutyCycleExceedsPeriod { pin: u8, duty_cycle: u32, period: u32 },

    #[error("Could not parse {content:?} from '{}' as an integer", .path.display())]
    Parse { path: PathBuf, content: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Sensor '{sensor}' used before initialization")]
    NotInitialized { sensor: String },

    #[error("Sensor '{sensor}' initialization failed: {reason}")]
    InitError { sensor: String, reason: String },

    #[error("{capability} is not yet supported")]
    Unsupported { capability: String },
}

impl HalError {
    /// Contract violations by the caller, as opposed to transient I/O failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HalError::UnknownPin { .. }
                | HalError::UnknownChannel { .. }
                | HalError::InvalidArgument { .. }
                | HalError::PeriodNotConfigured { .. }
                | HalError::DutyCycleExceedsPeriod { .. }
        )
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type HalResult<T> = Result<T, HalError>;

/// Logs a failed pin operation, contract violations at error level and I/O
/// failures as warnings, then hands the result back unchanged.
pub(crate) fn log_failure<T>(
    component: &str,
    operation: &str,
    pin: u8,
    result: HalResult<T>,
) -> HalResult<T> {
    if let Err(e) = &result {
        if e.is_validation() {
            error!("[{}] {} rejected for pin {}: {}", component, operation, pin, e);
        } else {
            warn!("[{}] {} failed for pin {}: {}", component, operation, pin, e);
        }
    }
    result
}

pub type ConfigResult<T> = Result<T, ConfigError>;
