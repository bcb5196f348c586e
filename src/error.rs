use thiserror::Error;

/// Rejections raised before any network activity.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("Unsupported file type. Please upload PNG, JPEG, WAV, MP3, or TXT.")]
    UnsupportedType { mime: String },
    #[error("File size exceeds 10MB limit.")]
    TooLarge { size: u64, limit: u64 },
}

/// Terminal failure of one upload attempt. `Display` is the message shown
/// to the user.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Non-success status with a `detail` message in the body
    #[error("{detail}")]
    Server { status: u16, detail: String },
    /// Non-success status without a usable `detail`
    #[error("Server error: {status}")]
    ServerStatus { status: u16 },
    #[error("Failed to process file. Check if the backend is running.")]
    Unreachable,
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
}

impl UploadError {
    /// Build the error for a non-success response from its raw body.
    pub fn from_error_body(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<crate::schema::ErrorBody>(body)
            .ok()
            .and_then(|b| b.message().map(str::to_string));
        match detail {
            Some(detail) => UploadError::Server { status, detail },
            None => UploadError::ServerStatus { status },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UploadError::Validation(_))
    }
}

/// Failure to read a local file before upload.
#[derive(Debug, Error)]
#[error("cannot read {path}: {source}")]
pub struct FileError {
    pub path: std::path::PathBuf,
    #[source]
    pub source: std::io::Error,
}
