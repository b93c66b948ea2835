//! Error types for djmix-daemon.
//!
//! Every component returns a [`MixError`] tagged with an [`ErrorCode`].
//! The RPC and CLI boundaries map the code to a caller-visible status once.

use std::fmt;

/// Error codes surfaced by the mixing pipeline.
///
/// These codes are stable strings in RPC responses and decide the
/// HTTP-like status reported to the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request is malformed.
    /// Trigger: fewer than two tracks, empty file name.
    BadRequest,

    /// A referenced track does not exist in the uploads directory.
    NotFound,

    /// The toolkit could not decode a track for analysis.
    /// Trigger: corrupt or unsupported audio file.
    DecodeError,

    /// Tempo/pitch/loudness rendering failed after the fallback retry.
    RenderError,

    /// Crossfade or multiplex encoding failed.
    ComposeError,

    /// ffmpeg is not installed or not executable.
    /// Fatal for every strategy.
    ToolkitUnavailable,

    /// The remote mixing endpoint failed.
    /// Never fatal on its own; the orchestrator falls back to a local mix.
    RemoteServiceError,

    /// Filesystem failure while staging or finalizing the artifact.
    Io,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DecodeError => "DECODE_ERROR",
            ErrorCode::RenderError => "RENDER_ERROR",
            ErrorCode::ComposeError => "COMPOSE_ERROR",
            ErrorCode::ToolkitUnavailable => "TOOLKIT_UNAVAILABLE",
            ErrorCode::RemoteServiceError => "REMOTE_SERVICE_ERROR",
            ErrorCode::Io => "IO_ERROR",
        }
    }

    /// Returns the HTTP-like status the calling layer reports for this code.
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::NotFound => 404,
            _ => 500,
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "Select at least two tracks to mix",
            ErrorCode::NotFound => "Upload the track again or refresh the track list",
            ErrorCode::DecodeError => {
                "Check that the file is a valid audio file (mp3, wav, m4a, flac, aac, ogg)"
            }
            ErrorCode::RenderError | ErrorCode::ComposeError => {
                "Inspect the ffmpeg output in the daemon log; try a simple (non-smart) mix"
            }
            ErrorCode::ToolkitUnavailable => {
                "Install ffmpeg and make sure it is on PATH, or set DJMIX_FFMPEG"
            }
            ErrorCode::RemoteServiceError => {
                "Verify DJMIX_REMOTE_ENDPOINT and DJMIX_REMOTE_API_KEY; local mixing is used meanwhile"
            }
            ErrorCode::Io => "Check free disk space and write permissions on the uploads directory",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for mixing operations.
#[derive(Debug)]
pub struct MixError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MixError {
    /// Creates a new MixError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new MixError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, reason)
    }

    /// Creates a NOT_FOUND error for a missing track.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("Track not found: {}", name.into()),
        )
    }

    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DecodeError,
            format!("Failed to decode audio: {}", reason.into()),
        )
    }

    pub fn render_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::RenderError,
            format!("Render failed: {}", reason.into()),
        )
    }

    pub fn compose_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ComposeError,
            format!("Mix encoding failed: {}", reason.into()),
        )
    }

    /// Creates a TOOLKIT_UNAVAILABLE error.
    pub fn toolkit_unavailable(program: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ToolkitUnavailable,
            format!("FFmpeg is not installed or not on PATH ({})", program.into()),
        )
    }

    pub fn remote_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::RemoteServiceError,
            format!("Remote mixing failed: {}", reason.into()),
        )
    }

    /// Creates an IO_ERROR wrapping a filesystem failure.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        let context = context.into();
        Self::with_source(ErrorCode::Io, format!("{}: {}", context, source), source)
    }

    /// Status reported to the calling layer.
    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

impl fmt::Display for MixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for MixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using MixError.
pub type Result<T> = std::result::Result<T, MixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::BadRequest.as_str(), "BAD_REQUEST");
        assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
        assert_eq!(ErrorCode::DecodeError.as_str(), "DECODE_ERROR");
        assert_eq!(ErrorCode::RenderError.as_str(), "RENDER_ERROR");
        assert_eq!(ErrorCode::ComposeError.as_str(), "COMPOSE_ERROR");
        assert_eq!(ErrorCode::ToolkitUnavailable.as_str(), "TOOLKIT_UNAVAILABLE");
        assert_eq!(ErrorCode::RemoteServiceError.as_str(), "REMOTE_SERVICE_ERROR");
        assert_eq!(ErrorCode::Io.as_str(), "IO_ERROR");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::BadRequest.status(), 400);
        assert_eq!(ErrorCode::NotFound.status(), 404);
        assert_eq!(ErrorCode::DecodeError.status(), 500);
        assert_eq!(ErrorCode::RenderError.status(), 500);
        assert_eq!(ErrorCode::ComposeError.status(), 500);
        assert_eq!(ErrorCode::ToolkitUnavailable.status(), 500);
        assert_eq!(ErrorCode::Io.status(), 500);
    }

    #[test]
    fn error_code_recovery_hints_not_empty() {
        for code in [
            ErrorCode::BadRequest,
            ErrorCode::NotFound,
            ErrorCode::DecodeError,
            ErrorCode::RenderError,
            ErrorCode::ComposeError,
            ErrorCode::ToolkitUnavailable,
            ErrorCode::RemoteServiceError,
            ErrorCode::Io,
        ] {
            assert!(!code.recovery_hint().is_empty(), "{} has no hint", code);
        }
    }

    #[test]
    fn mix_error_display() {
        let err = MixError::not_found("track.mp3");
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("track.mp3"));
        assert!(err.to_string().contains("Recovery:"));
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error;
        let err = MixError::io(
            "rename failed",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code, ErrorCode::Io);
        assert!(err.source().is_some());
    }
}
