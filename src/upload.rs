//! Upload controller: file intake, client-side validation, and the single
//! request per attempt.
//!
//! Every attempt ends in exactly one outcome recorded in the controller's
//! [`UiState`]. Validation runs before the transport is touched, so rejected
//! files never reach the network.

use crate::config::{CliConfig, DEFAULT_MAX_FILE_SIZE};
use crate::error::{FileError, UploadError, ValidationError};
use crate::schema::DetectionResponse;
use crate::state::{Session, Ticket, UiState};
use crate::transport::Transport;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "audio/wav",
    "audio/mpeg",
    "text/plain",
];

/// Advisory only; the MIME check is the binding one.
pub const ADVISORY_EXTENSIONS: &[&str] = &[".png", ".jpeg", ".jpg", ".wav", ".mp3", ".txt"];

/// A file picked by the user, with the MIME type it was declared as.
///
/// Files opened from disk carry only their path and size until the
/// transport asks for the contents, so validation never reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    size: u64,
    contents: Contents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Contents {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size: bytes.len() as u64,
            contents: Contents::Memory(bytes),
        }
    }

    /// Open a file on disk. Only metadata is read here. The MIME type is
    /// derived from the extension; unknown extensions get an empty type.
    pub async fn from_path(path: &Path) -> Result<Self, FileError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|source| FileError {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.is_dir() {
            return Err(FileError {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            mime: mime_for_path(path),
            size: metadata.len(),
            contents: Contents::Disk(path.to_path_buf()),
        })
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether the contents are still on disk, unread.
    pub fn is_on_disk(&self) -> bool {
        matches!(self.contents, Contents::Disk(_))
    }

    /// The file's bytes, read from disk on demand.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, FileError> {
        match &self.contents {
            Contents::Memory(bytes) => Ok(bytes.clone()),
            Contents::Disk(path) => tokio::fs::read(path).await.map_err(|source| FileError {
                path: path.clone(),
                source,
            }),
        }
    }
}

pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_file_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl From<&CliConfig> for Limits {
    fn from(config: &CliConfig) -> Self {
        Self {
            max_file_size: config.limits.max_file_size,
        }
    }
}

/// Type check first, then size.
pub fn validate(file: &SelectedFile, limits: &Limits) -> Result<(), ValidationError> {
    if !ALLOWED_MIME_TYPES.contains(&file.mime.as_str()) {
        return Err(ValidationError::UnsupportedType {
            mime: file.mime.clone(),
        });
    }
    if file.size() > limits.max_file_size {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            limit: limits.max_file_size,
        });
    }
    Ok(())
}

/// Single-file input slot. Emptied after every attempt so the same file can
/// be selected again.
#[derive(Debug, Default)]
pub struct FileInput {
    selected: Option<SelectedFile>,
}

impl FileInput {
    pub fn select(&mut self, file: SelectedFile) {
        self.selected = Some(file);
    }

    pub fn value(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }

    fn take(&mut self) -> Option<SelectedFile> {
        self.selected.take()
    }
}

pub struct UploadController<T> {
    transport: T,
    limits: Limits,
    session: Mutex<Session>,
}

impl<T: Transport> UploadController<T> {
    pub fn new(transport: T, limits: Limits) -> Self {
        Self {
            transport,
            limits,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn state(&self) -> UiState {
        self.session().state().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.session().state().is_loading()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Back to `Idle`; any in-flight response is ignored when it lands.
    pub fn clear(&self) {
        self.session().clear();
    }

    /// Upload the file currently in the input slot. The slot is empty
    /// afterwards whatever the outcome.
    pub async fn handle_input(
        &self,
        input: &mut FileInput,
    ) -> Option<Result<DetectionResponse, UploadError>> {
        let file = input.take()?;
        Some(self.upload(file).await)
    }

    /// Only the first dropped file is processed.
    pub async fn handle_drop(
        &self,
        files: Vec<SelectedFile>,
    ) -> Option<Result<DetectionResponse, UploadError>> {
        let file = files.into_iter().next()?;
        Some(self.upload(file).await)
    }

    /// Validate, send, and record the outcome of one attempt.
    ///
    /// The returned result is this attempt's own outcome. The shared state
    /// only takes it if no newer attempt (or clear) started in the meantime.
    pub async fn upload(&self, file: SelectedFile) -> Result<DetectionResponse, UploadError> {
        if let Err(err) = validate(&file, &self.limits) {
            tracing::debug!(file = %file.name, mime = %file.mime, size = file.size(), "rejected before upload");
            let err = UploadError::from(err);
            self.session().reject(err.to_string());
            return Err(err);
        }

        let ticket = self.session().begin();
        tracing::debug!(file = %file.name, size = file.size(), generation = ticket.generation(), "uploading");

        let result = self.transport.send(&file).await;
        if let Err(err) = &result {
            tracing::warn!(file = %file.name, error = %err, "upload failed");
        }
        self.finish(ticket, &result);
        result
    }

    fn finish(&self, ticket: Ticket, result: &Result<DetectionResponse, UploadError>) {
        let next = match result {
            Ok(response) => UiState::Success(response.clone()),
            Err(err) => UiState::Error(err.to_string()),
        };
        if !self.session().complete(ticket, next) {
            tracing::debug!(generation = ticket.generation(), "discarding superseded response");
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // State is replaced wholesale on every write, so a poisoned lock
        // still holds a consistent value.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}
