mod common;

use common::{LIKELY_RESPONSE, StubServer, closed_endpoint};
use stegcheck::schema::DetectionStatus;
use stegcheck::transport::{HttpTransport, Transport};
use stegcheck::upload::Limits;
use stegcheck::{SelectedFile, UiState, UploadController, UploadError};

fn png() -> SelectedFile {
    SelectedFile::new("cat.png", "image/png", b"\x89PNG fake image bytes".to_vec())
}

#[tokio::test]
async fn posts_multipart_file_field() {
    let server = StubServer::start(200, LIKELY_RESPONSE);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    transport.send(&png()).await.unwrap();

    let request = server.last_request();
    assert!(request.starts_with("POST /detect HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"cat.png\""));
    assert!(request.contains("Content-Type: image/png"));
    assert!(request.contains("fake image bytes"));
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn sends_file_read_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, b"plain text payload").unwrap();
    let server = StubServer::start(200, LIKELY_RESPONSE);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let file = SelectedFile::from_path(&path).await.unwrap();
    transport.send(&file).await.unwrap();

    let request = server.last_request();
    assert!(request.contains("filename=\"note.txt\""));
    assert!(request.contains("Content-Type: text/plain"));
    assert!(request.contains("plain text payload"));
}

#[tokio::test]
async fn vanished_file_is_a_transport_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, b"hello").unwrap();
    let file = SelectedFile::from_path(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();
    let server = StubServer::start(200, LIKELY_RESPONSE);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let err = transport.send(&file).await.unwrap_err();

    assert!(matches!(&err, UploadError::Transport(msg) if msg.starts_with("cannot read")));
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn decodes_success_response() {
    let server = StubServer::start(200, LIKELY_RESPONSE);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let response = transport.send(&png()).await.unwrap();

    assert_eq!(response.filename, "cat.png");
    assert_eq!(response.detection.status, DetectionStatus::Likely);
    assert_eq!(response.detection.confidence, 0.87);
    let keys: Vec<_> = response.detection.details.keys().collect();
    assert_eq!(keys, ["lsb_ratio", "chi_square_p"]);
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let server = StubServer::start(400, r#"{"detail": "corrupt file"}"#);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let err = transport.send(&png()).await.unwrap_err();

    assert_eq!(
        err,
        UploadError::Server {
            status: 400,
            detail: "corrupt file".into()
        }
    );
    assert_eq!(err.to_string(), "corrupt file");
}

#[tokio::test]
async fn error_without_detail_uses_status() {
    let server = StubServer::start(500, r#"{"error": "internal"}"#);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let err = transport.send(&png()).await.unwrap_err();
    assert_eq!(err.to_string(), "Server error: 500");
}

#[tokio::test]
async fn error_with_non_json_body_uses_status() {
    let server = StubServer::start(404, "not found");
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let err = transport.send(&png()).await.unwrap_err();
    assert_eq!(err, UploadError::ServerStatus { status: 404 });
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let server = StubServer::start(200, r#"{"filename": "cat.png"}"#);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let err = transport.send(&png()).await.unwrap_err();
    assert!(matches!(err, UploadError::Decode(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn unknown_status_value_is_decode_error() {
    let body = LIKELY_RESPONSE.replace("\"likely\"", "\"possible\"");
    let server = StubServer::start(200, &body);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();

    let err = transport.send(&png()).await.unwrap_err();
    assert!(matches!(err, UploadError::Decode(_)));
}

#[tokio::test]
async fn unreachable_backend_message() {
    let transport = HttpTransport::new(closed_endpoint(), None).unwrap();

    let err = transport.send(&png()).await.unwrap_err();
    assert_eq!(err, UploadError::Unreachable);
    assert_eq!(
        err.to_string(),
        "Failed to process file. Check if the backend is running."
    );
}

#[tokio::test]
async fn controller_over_http_round_trip() {
    let server = StubServer::start(200, LIKELY_RESPONSE);
    let transport = HttpTransport::new(server.url.clone(), None).unwrap();
    let controller = UploadController::new(transport, Limits::default());

    controller.upload(png()).await.unwrap();
    let state = controller.state();
    assert!(matches!(state, UiState::Success(_)));
    assert_eq!(state.result().unwrap().file_type, "image");

    // rejected files never hit the server
    let _ = controller
        .upload(SelectedFile::new("doc.pdf", "application/pdf", vec![1]))
        .await;
    assert_eq!(server.request_count(), 1);
}
