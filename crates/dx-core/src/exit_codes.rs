//! Exit codes for the dx-core CLI.
//!
//! Exit code ranges:
//! - 0-1: Success outcomes
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use dx_common::Error;

/// Exit codes for dx-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Success (0-1)
    // ========================================================================
    /// Every view captured.
    Clean = 0,

    /// Artifact written, but some views are placeholders.
    Degraded = 1,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Configuration missing, unreadable or invalid
    ConfigError = 11,

    /// Data not generated yet for the visible periods
    DataNotReady = 12,

    /// Chart library could not be located
    AssetError = 13,

    /// Another export is running
    BusyError = 14,

    /// The dashboard driver failed
    DriverError = 15,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        (self as i32) < 10
    }

    /// User/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Degraded => "OK_DEGRADED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DataNotReady => "ERR_DATA_NOT_READY",
            ExitCode::AssetError => "ERR_ASSET",
            ExitCode::BusyError => "ERR_BUSY",
            ExitCode::DriverError => "ERR_DRIVER",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::DuplicatePeriod { .. } | Error::ComputationInvalid { .. } => {
                ExitCode::DataNotReady
            }
            Error::AssetLoad { .. } => ExitCode::AssetError,
            Error::ExportInProgress => ExitCode::BusyError,
            Error::Driver(_)
            | Error::ElementNotFound { .. }
            | Error::ReadinessTimeout { .. } => ExitCode::DriverError,
            Error::Io(_) => ExitCode::IoError,
            Error::StyleExtraction { .. } | Error::Render(_) | Error::Json(_) => {
                ExitCode::InternalError
            }
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::Degraded.is_success());
        assert!(ExitCode::BusyError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::ConfigError.is_internal_error());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::from(&Error::ComputationInvalid { periods: 3 }),
            ExitCode::DataNotReady
        );
        assert_eq!(
            ExitCode::from(&Error::AssetLoad {
                reason: "none".into()
            }),
            ExitCode::AssetError
        );
        assert_eq!(ExitCode::from(&Error::ExportInProgress), ExitCode::BusyError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::AssetError.to_string(), "ERR_ASSET (13)");
        assert_eq!(i32::from(ExitCode::Degraded), 1);
    }
}
