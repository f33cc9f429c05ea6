//! Exchange outcomes.

use std::fmt;

/// Outcome of one command/response exchange.
///
/// Every exchange produces exactly one code. Codes other than `Success`
/// are normal return values, not errors in the Rust sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Command accepted and response valid.
    Success,
    /// Frequency accepted but outside the calibrated range.
    WarningFrequency,
    /// Serial port could not be opened.
    ErrorOpenPort,
    /// Response missing or shorter than the expected frame.
    ErrorTimeout,
    /// Device rejected the command frame checksum.
    ErrorSendChecksum,
    /// Response frame checksum did not match.
    ErrorReceiveChecksum,
    /// Requested save slot holds no frequency.
    ErrorNoSavedFrequency,
    /// Generic device error.
    Error,
}

impl ResultCode {
    /// Check if this is `Success`.
    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    /// Identifier printed by the command-line tool.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Success => "RET_SUCCESS",
            ResultCode::WarningFrequency => "RET_WARNING_FREQ",
            ResultCode::ErrorOpenPort => "RET_ERROR_OPEN_COM",
            ResultCode::ErrorTimeout => "RET_ERROR_TIMEOUT",
            ResultCode::ErrorSendChecksum => "RET_ERROR_SEND_LRC",
            ResultCode::ErrorReceiveChecksum => "RET_ERROR_RECV_LRC",
            ResultCode::ErrorNoSavedFrequency => "RET_ERROR_NO_SAVED_FREQ",
            ResultCode::Error => "RET_ERROR",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result code paired with the decoded value, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Exchange outcome.
    pub code: ResultCode,
    /// Decoded value. Only present on success.
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    /// Successful outcome with a value.
    pub fn success(value: T) -> Self {
        Outcome {
            code: ResultCode::Success,
            value: Some(value),
        }
    }

    /// Outcome without a value.
    pub fn failed(code: ResultCode) -> Self {
        Outcome { code, value: None }
    }

    /// Transform the value, keeping the code.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            code: self.code,
            value: self.value.map(f),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "({}, {})", self.code, value),
            None => write!(f, "({}, None)", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::success(100_000u32).to_string(), "(RET_SUCCESS, 100000)");
        assert_eq!(
            Outcome::<u32>::failed(ResultCode::ErrorTimeout).to_string(),
            "(RET_ERROR_TIMEOUT, None)"
        );
    }

    #[test]
    fn test_outcome_map() {
        let out = Outcome::success(3u8).map(|v| v as u32 * 2);
        assert_eq!(out.value, Some(6));
        assert!(out.code.is_success());
    }
}
