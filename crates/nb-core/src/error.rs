//! # NoticeError
//!
//! Centralized error handling for the notice writer.
//! Maps transport, response and image failures to actionable error types.

use std::time::Duration;
use thiserror::Error;

/// The primary error type for all nb-core operations and ports.
#[derive(Error, Debug)]
pub enum NoticeError {
    /// The request never produced a response (DNS, connect, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("unexpected status: {0}")]
    Status(u16),

    /// The response body was not the JSON we expected
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The insert response carried no usable `notice_no`
    #[error("no notice number returned")]
    MissingNoticeNo,

    /// Lookup of a single notice found nothing
    #[error("notice {0} not found")]
    NotFound(String),

    /// The string is not a `data:<mime>;base64,<payload>` URI we can read
    #[error("invalid data uri: {0}")]
    InvalidDataUri(String),

    /// The raster surface could not decode the image bytes
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    /// Decoding did not finish within the configured deadline
    #[error("image decode timed out after {0:?}")]
    DecodeTimeout(Duration),

    /// Re-encoding the resampled raster failed
    #[error("image encode failed: {0}")]
    ImageEncode(String),
}

impl NoticeError {
    /// True for the failures of the save request itself: transport, status
    /// and response shape. Image failures happen before any request is sent.
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            NoticeError::Transport(_)
                | NoticeError::Status(_)
                | NoticeError::MalformedResponse(_)
                | NoticeError::MissingNoticeNo
        )
    }
}

/// A specialized Result type for notice writer logic.
pub type Result<T> = std::result::Result<T, NoticeError>;
