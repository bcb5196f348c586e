pub mod config;
pub mod error;
pub mod render;
pub mod schema;
pub mod state;
pub mod transport;
pub mod upload;

pub use error::{UploadError, ValidationError};
pub use schema::DetectionResponse;
pub use state::UiState;
pub use upload::{FileInput, SelectedFile, UploadController};
