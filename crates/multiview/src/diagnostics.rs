//! Graphics error reporting
//!
//! Toolkits collect the errors their graphics API raised; the context drains
//! them after operations that draw and logs each one with the location of the
//! call that triggered the check.

use std::fmt;
use std::panic::Location;

/// One error reported by the toolkit or graphics API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuError {
    /// Numeric error code
    pub code: u32,
    /// Human-readable description
    pub message: String,
}

impl GpuError {
    /// Create an error record
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.message, self.code)
    }
}

/// Log every pending error and return the code of the last one
///
/// Returns `None` when there was nothing to report.
#[track_caller]
pub fn report_errors<I>(operation: &str, errors: I) -> Option<u32>
where
    I: IntoIterator<Item = GpuError>,
{
    let location = Location::caller();
    let mut last = None;
    for error in errors {
        log::warn!(
            "Graphics error after {} at {}:{}: {}",
            operation,
            location.file(),
            location.line(),
            error
        );
        last = Some(error.code);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_errors_reports_none() {
        assert_eq!(report_errors("display", Vec::new()), None);
    }

    #[test]
    fn test_last_code_is_returned() {
        let errors = vec![
            GpuError::new(0x0500, "invalid enum"),
            GpuError::new(0x0502, "invalid operation"),
        ];
        assert_eq!(report_errors("display", errors), Some(0x0502));
    }

    #[test]
    fn test_display_format() {
        let error = GpuError::new(0x0501, "invalid value");
        assert_eq!(error.to_string(), "invalid value (0x0501)");
    }
}
