/// Marker a proof-of-concept script prints when the device connection died
/// mid-request.
pub const EXCEPTION_MARKER: &str = "EXCEPTION";

/// Marker a script prints when its own request timed out.
pub const TIMEOUT_MARKER: &str = "TIMEOUT";

/// What one attempt's combined stdout/stderr tells us about the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exception marker seen: the service dropped the connection, likely
    /// crashed.
    Crash,
    /// Timeout marker seen: device unresponsive, worth retrying after a
    /// pause.
    Timeout,
    /// A 500 in the output: the handler choked on the payload.
    ServerError,
    /// A 200 in the output: request accepted, nothing broke.
    Benign,
    /// Output matched none of the markers.
    Unclassified,
}

impl Outcome {
    /// Classify combined output. Markers are checked in fixed precedence:
    /// exception, then timeout, then 500, then 200.
    pub fn classify(output: &str) -> Self {
        if output.contains(EXCEPTION_MARKER) {
            Self::Crash
        } else if output.contains(TIMEOUT_MARKER) {
            Self::Timeout
        } else if output.contains("500") {
            Self::ServerError
        } else if output.contains("200") {
            Self::Benign
        } else {
            Self::Unclassified
        }
    }

    /// Crash and server-error attempts record the artifact as a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Crash | Self::ServerError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_beats_everything() {
        assert_eq!(Outcome::classify("500 EXCEPTION TIMEOUT 200"), Outcome::Crash);
    }

    #[test]
    fn test_timeout_beats_status_codes() {
        assert_eq!(Outcome::classify("TIMEOUT after 500"), Outcome::Timeout);
    }

    #[test]
    fn test_status_markers() {
        assert_eq!(Outcome::classify("HTTP/1.1 500 Internal Server Error"), Outcome::ServerError);
        assert_eq!(Outcome::classify("status: 200 OK"), Outcome::Benign);
    }

    #[test]
    fn test_marker_is_substring_match() {
        // any occurrence of the digits counts, 5000 included
        assert_eq!(Outcome::classify("took 5000ms"), Outcome::ServerError);
    }

    #[test]
    fn test_unclassified() {
        assert_eq!(Outcome::classify(""), Outcome::Unclassified);
        assert_eq!(Outcome::classify("connection reset"), Outcome::Unclassified);
    }

    #[test]
    fn test_success_states() {
        assert!(Outcome::Crash.is_success());
        assert!(Outcome::ServerError.is_success());
        assert!(!Outcome::Timeout.is_success());
        assert!(!Outcome::Benign.is_success());
        assert!(!Outcome::Unclassified.is_success());
    }
}
