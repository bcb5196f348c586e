use crate::config::CliConfig;
use crate::error::UploadError;
use crate::schema::DetectionResponse;
use crate::upload::SelectedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

/// Multipart field carrying the file bytes.
pub const FILE_FIELD: &str = "file";

/// Sends one file to the detection service and decodes the reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, file: &SelectedFile) -> Result<DetectionResponse, UploadError>;
}

/// `POST <endpoint>` with a single multipart part named `file`.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, UploadError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &CliConfig) -> Result<Self, UploadError> {
        Self::new(config.service.endpoint.clone(), config.service.timeout())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, file: &SelectedFile) -> Result<DetectionResponse, UploadError> {
        let bytes = file
            .read_bytes()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(transport_error)?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(UploadError::from_error_body(status.as_u16(), &body));
        }

        serde_json::from_slice(&body).map_err(|e| UploadError::Decode(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> UploadError {
    if err.is_connect() {
        UploadError::Unreachable
    } else {
        UploadError::Transport(err.to_string())
    }
}
