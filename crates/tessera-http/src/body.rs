//! Request body parsing.
//!
//! Form, JSON and multipart bodies are turned into a field map plus the
//! uploaded files. Malformed form or JSON bodies yield no fields; a
//! malformed multipart body is a client error.

use std::path::PathBuf;

use bytes::Bytes;
use http::{header, HeaderMap};
use indexmap::IndexMap;
use serde_json::Value;
use tessera_core::{TesseraError, TesseraResult};

use crate::field::{insert_value, parse_field_name, InputMap};
use crate::upload::{FileInput, UploadFile};

/// Default maximum size of one uploaded file (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of multipart fields.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while parsing request bodies.
#[derive(Debug, Clone)]
pub struct BodyLimits {
    /// Maximum size of one uploaded file in bytes.
    pub max_file_size: usize,
    /// Maximum number of multipart fields.
    pub max_fields: usize,
    /// Directory for upload temp files, the system temp dir when `None`.
    pub upload_dir: Option<PathBuf>,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
            upload_dir: None,
        }
    }
}

impl BodyLimits {
    /// Creates limits with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum file size.
    #[must_use]
    pub fn max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Sets the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }

    /// Sets the upload directory.
    #[must_use]
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }
}

/// Parsed body fields and files.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedBody {
    pub(crate) fields: InputMap,
    pub(crate) files: IndexMap<String, FileInput>,
}

/// Parses a urlencoded string, e.g. a query string, into a field map.
pub(crate) fn parse_urlencoded(input: &[u8]) -> InputMap {
    let mut fields = InputMap::new();
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(input) {
        Ok(pairs) => {
            for (name, value) in pairs {
                insert_value(&mut fields, &name, Value::String(value));
            }
        }
        Err(err) => tracing::debug!(error = %err, "ignoring malformed urlencoded input"),
    }
    fields
}

fn parse_json(body: &[u8]) -> InputMap {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(entries)) => entries.into_iter().collect(),
        Ok(_) => InputMap::new(),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed JSON body");
            InputMap::new()
        }
    }
}

/// Parses a body according to its `Content-Type`.
pub(crate) async fn parse_body(
    headers: &HeaderMap,
    body: Bytes,
    limits: &BodyLimits,
) -> TesseraResult<ParsedBody> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return Ok(ParsedBody::default());
    };

    let (kind, subtype) = (mime.type_(), mime.subtype());
    if kind == mime::APPLICATION && subtype == mime::WWW_FORM_URLENCODED {
        Ok(ParsedBody {
            fields: parse_urlencoded(&body),
            files: IndexMap::new(),
        })
    } else if kind == mime::APPLICATION && subtype == mime::JSON {
        Ok(ParsedBody {
            fields: parse_json(&body),
            files: IndexMap::new(),
        })
    } else if kind == mime::MULTIPART && subtype == mime::FORM_DATA {
        parse_multipart(content_type, body, limits).await
    } else {
        Ok(ParsedBody::default())
    }
}

fn bad_multipart(err: multer::Error) -> TesseraError {
    TesseraError::internal_with_code(400, format!("Malformed multipart body: {err}"))
}

async fn parse_multipart(
    content_type: &str,
    body: Bytes,
    limits: &BodyLimits,
) -> TesseraResult<ParsedBody> {
    let boundary = multer::parse_boundary(content_type).map_err(bad_multipart)?;
    let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parsed = ParsedBody::default();
    let mut count = 0;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        count += 1;
        if count > limits.max_fields {
            return Err(TesseraError::internal_with_code(
                400,
                format!("Too many multipart fields (max {})", limits.max_fields),
            ));
        }

        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            None => {
                let text = field.text().await.map_err(bad_multipart)?;
                insert_value(&mut parsed.fields, &name, Value::String(text));
            }
            Some(file_name) => {
                let mime_type = field
                    .content_type()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let data = field.bytes().await.map_err(bad_multipart)?;
                let upload = UploadFile::store(file_name, mime_type, data, limits).await;

                let (root, path) = parse_field_name(&name);
                match parsed.files.get_mut(&root) {
                    Some(existing) => existing.insert(&path, upload),
                    None => {
                        parsed.files.insert(root, FileInput::build(&path, upload));
                    }
                }
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        map
    }

    #[tokio::test]
    async fn test_urlencoded_body() {
        let parsed = parse_body(
            &headers("application/x-www-form-urlencoded"),
            Bytes::from_static(b"name=ann&tags[]=a&tags[]=b"),
            &BodyLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(parsed.fields["name"], "ann");
        assert_eq!(parsed.fields["tags"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_json_body_object_only() {
        let limits = BodyLimits::default();
        let object = parse_body(
            &headers("application/json; charset=utf-8"),
            Bytes::from_static(br#"{"a":1,"b":{"c":true}}"#),
            &limits,
        )
        .await
        .unwrap();
        assert_eq!(object.fields["a"], 1);
        assert_eq!(object.fields["b"], json!({"c": true}));

        let array = parse_body(&headers("application/json"), Bytes::from_static(b"[1,2]"), &limits)
            .await
            .unwrap();
        assert!(array.fields.is_empty());

        let broken = parse_body(&headers("application/json"), Bytes::from_static(b"{"), &limits)
            .await
            .unwrap();
        assert!(broken.fields.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let body = "--XyZ\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\r\n\
hello\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"photos[]\"; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\r\n\
aaa\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"photos[]\"; filename=\"b.txt\"\r\n\
Content-Type: text/plain\r\n\r\n\
bb\r\n\
--XyZ--\r\n";

        let parsed = parse_body(
            &headers("multipart/form-data; boundary=XyZ"),
            Bytes::from(body),
            &BodyLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(parsed.fields["title"], "hello");
        let photos = parsed.files["photos"].files();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].upload_name(), "a.txt");
        assert_eq!(photos[1].size(), 2);
        assert!(photos.iter().all(|f| f.is_valid()));
    }

    #[tokio::test]
    async fn test_multipart_field_limit() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n\
--b\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\n2\r\n--b--\r\n";

        let err = parse_body(
            &headers("multipart/form-data; boundary=b"),
            Bytes::from(body),
            &BodyLimits::default().max_fields(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), 400);
    }

    #[tokio::test]
    async fn test_unknown_content_type_yields_nothing() {
        let parsed = parse_body(
            &headers("text/plain"),
            Bytes::from_static(b"a=b"),
            &BodyLimits::default(),
        )
        .await
        .unwrap();
        assert!(parsed.fields.is_empty());
        assert!(parsed.files.is_empty());
    }
}
