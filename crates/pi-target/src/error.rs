//! PI status codes and error handling.
//!
//! Backends report failures as [`PiError`]; the dispatcher returns them to
//! the caller unchanged.

use std::fmt;
use thiserror::Error;

/// PI status codes.
///
/// Values from [`PiStatus::TargetError`] upward are reserved for
/// target-specific codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiStatus {
    Success = 0,
    AllocError = 1,
    DevOutOfRange = 2,
    DevAlreadyAssigned = 3,
    DevNotAssigned = 4,
    InvalidArgument = 5,
    NotImplemented = 6,
    CounterNotFound = 7,
    InvalidEntryHandle = 8,
    TargetError = 1000,
}

impl PiStatus {
    /// Creates a PiStatus from a raw i32 value.
    ///
    /// Returns `None` for codes that are not standard PI statuses, such
    /// as target-specific codes above [`PiStatus::TargetError`]. Use
    /// [`PiError::check_raw`] to keep such codes.
    pub fn from_raw(status: i32) -> Option<Self> {
        match status {
            0 => Some(PiStatus::Success),
            1 => Some(PiStatus::AllocError),
            2 => Some(PiStatus::DevOutOfRange),
            3 => Some(PiStatus::DevAlreadyAssigned),
            4 => Some(PiStatus::DevNotAssigned),
            5 => Some(PiStatus::InvalidArgument),
            6 => Some(PiStatus::NotImplemented),
            7 => Some(PiStatus::CounterNotFound),
            8 => Some(PiStatus::InvalidEntryHandle),
            1000 => Some(PiStatus::TargetError),
            _ => None,
        }
    }

    /// Returns the raw status code.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == PiStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> PiResult<()> {
        match PiError::from_status(self) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Display for PiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PiStatus::Success => "PI_STATUS_SUCCESS",
            PiStatus::AllocError => "PI_STATUS_ALLOC_ERROR",
            PiStatus::DevOutOfRange => "PI_STATUS_DEV_OUT_OF_RANGE",
            PiStatus::DevAlreadyAssigned => "PI_STATUS_DEV_ALREADY_ASSIGNED",
            PiStatus::DevNotAssigned => "PI_STATUS_DEV_NOT_ASSIGNED",
            PiStatus::InvalidArgument => "PI_STATUS_INVALID_ARGUMENT",
            PiStatus::NotImplemented => "PI_STATUS_NOT_IMPLEMENTED",
            PiStatus::CounterNotFound => "PI_STATUS_COUNTER_NOT_FOUND",
            PiStatus::InvalidEntryHandle => "PI_STATUS_INVALID_ENTRY_HANDLE",
            PiStatus::TargetError => "PI_STATUS_TARGET_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Error type for PI target operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PiError {
    /// A PI status code without further detail.
    #[error("PI operation failed: {status}")]
    Status { status: PiStatus },

    /// No backend is assigned to the device.
    #[error("device {device_id} is not assigned to a target")]
    DevNotAssigned { device_id: u64 },

    /// The device already has a backend.
    #[error("device {device_id} is already assigned to a target")]
    DevAlreadyAssigned { device_id: u64 },

    /// Invalid argument passed to a target operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Target-specific failure.
    #[error("target error {code}: {message}")]
    Target { code: i32, message: String },
}

impl PiError {
    /// Creates an error from a PI status code.
    ///
    /// Returns `None` for [`PiStatus::Success`], which is not an error.
    pub fn from_status(status: PiStatus) -> Option<Self> {
        match status {
            PiStatus::Success => None,
            PiStatus::InvalidArgument => Some(PiError::InvalidArgument {
                message: format!("target returned {}", status),
            }),
            _ => Some(PiError::Status { status }),
        }
    }

    /// Converts a raw status code reported by a backend.
    ///
    /// Zero is success. Codes that are not standard PI statuses become
    /// [`PiError::Target`] carrying the original code.
    pub fn check_raw(code: i32) -> PiResult<()> {
        match PiStatus::from_raw(code) {
            Some(status) => status.into_result(),
            None => Err(PiError::Target {
                code,
                message: format!("target status {}", code),
            }),
        }
    }

    /// Creates an invalid argument error with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        PiError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a target-specific error.
    pub fn target(code: i32, message: impl Into<String>) -> Self {
        PiError::Target {
            code,
            message: message.into(),
        }
    }

    /// Returns the status code this error reports.
    pub fn status(&self) -> PiStatus {
        match self {
            PiError::Status { status } => *status,
            PiError::DevNotAssigned { .. } => PiStatus::DevNotAssigned,
            PiError::DevAlreadyAssigned { .. } => PiStatus::DevAlreadyAssigned,
            PiError::InvalidArgument { .. } => PiStatus::InvalidArgument,
            PiError::Target { .. } => PiStatus::TargetError,
        }
    }

    /// Returns the raw code of this error, including target-specific
    /// codes.
    pub fn raw_code(&self) -> i32 {
        match self {
            PiError::Target { code, .. } => *code,
            other => other.status().as_raw(),
        }
    }
}

/// Result type for PI target operations.
pub type PiResult<T> = Result<T, PiError>;
