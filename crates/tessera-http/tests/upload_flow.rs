//! Multipart requests parsed through [`Request`], from raw body to stored
//! upload.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use tessera_http::{BodyLimits, FileInput, Request, UploadErrorCode};

fn multipart(body: &'static str) -> Request {
    Request::new(
        http::Request::post("/upload?album=summer")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XyZ")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap(),
    )
}

const BODY: &str = "--XyZ\r\n\
Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
sunset\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"avatar\"; filename=\"me.png\"\r\n\
Content-Type: image/png\r\n\r\n\
PNGDATA\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"docs[cv]\"; filename=\"cv.pdf\"\r\n\
Content-Type: application/pdf\r\n\r\n\
%PDF\r\n\
--XyZ--\r\n";

#[tokio::test]
async fn fields_and_files_reach_the_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut request = multipart(BODY);
    request
        .parse_body(&BodyLimits::default().upload_dir(dir.path()))
        .await
        .unwrap();

    assert_eq!(request.post("caption").unwrap(), "sunset");
    assert_eq!(request.input("album", ""), "summer");
    assert_eq!(request.all().len(), 2);

    let avatar = request.file("avatar").and_then(FileInput::as_single).unwrap();
    assert!(avatar.is_valid());
    assert_eq!(avatar.upload_name(), "me.png");
    assert_eq!(avatar.upload_mime_type(), "image/png");
    assert_eq!(avatar.upload_extension(), Some("png"));
    assert!(avatar.path().unwrap().starts_with(dir.path()));

    let cv = request
        .file("docs")
        .and_then(|docs| docs.get("cv"))
        .and_then(FileInput::as_single)
        .unwrap();
    assert_eq!(cv.size(), 4);
}

#[tokio::test]
async fn stored_upload_can_be_moved() {
    let dir = tempfile::tempdir().unwrap();
    let mut request = multipart(BODY);
    request.parse_body(&BodyLimits::default()).await.unwrap();

    let avatar = request.file("avatar").and_then(FileInput::as_single).unwrap();
    let target = dir.path().join("avatars/1/me.png");
    let moved = avatar.move_to(&target).unwrap();

    assert_eq!(moved, target);
    assert_eq!(std::fs::read(&target).unwrap(), b"PNGDATA");
    assert!(avatar.path().unwrap().exists());
}

#[tokio::test]
async fn oversized_upload_is_kept_as_failed_entry() {
    let mut request = multipart(BODY);
    request
        .parse_body(&BodyLimits::default().max_file_size(5))
        .await
        .unwrap();

    let avatar = request.file("avatar").and_then(FileInput::as_single).unwrap();
    assert!(!avatar.is_valid());
    assert_eq!(avatar.error(), UploadErrorCode::IniSize);
    assert!(avatar.move_to(std::env::temp_dir().join("never.png")).is_err());

    let cv = request
        .file("docs")
        .and_then(|docs| docs.get("cv"))
        .and_then(FileInput::as_single)
        .unwrap();
    assert!(cv.is_valid());
}

#[tokio::test]
async fn multipart_without_boundary_is_rejected() {
    let mut request = Request::new(
        http::Request::post("/upload")
            .header(CONTENT_TYPE, "multipart/form-data")
            .body(Bytes::from_static(b"--x--"))
            .unwrap(),
    );
    let err = request.parse_body(&BodyLimits::default()).await.unwrap_err();
    assert_eq!(err.code(), 400);
}
