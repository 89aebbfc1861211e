//! Uploaded files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use tempfile::TempPath;
use tessera_core::{TesseraError, TesseraResult};

use crate::body::BodyLimits;
use crate::field::FieldSegment;

/// Upload status codes, numbered the way upload clients conventionally
/// expect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UploadErrorCode {
    /// The file was received in full.
    Ok = 0,
    /// The file exceeds the configured per-file limit.
    IniSize = 1,
    /// The file exceeds a limit declared by the form.
    FormSize = 2,
    /// Only part of the file was received.
    Partial = 3,
    /// The field was submitted without a file.
    NoFile = 4,
    /// No temporary directory is available.
    NoTmpDir = 6,
    /// The file could not be written to disk.
    CantWrite = 7,
    /// An extension stopped the upload.
    Extension = 8,
}

impl UploadErrorCode {
    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One uploaded file, stored in a temporary file that is removed when the
/// last clone of the request is dropped.
#[derive(Debug, Clone)]
pub struct UploadFile {
    temp: Option<Arc<TempPath>>,
    upload_name: String,
    upload_mime_type: String,
    size: u64,
    error: UploadErrorCode,
}

impl UploadFile {
    /// Creates an upload that failed with `error` and has no stored content.
    #[must_use]
    pub fn failed(
        upload_name: impl Into<String>,
        upload_mime_type: impl Into<String>,
        size: u64,
        error: UploadErrorCode,
    ) -> Self {
        Self {
            temp: None,
            upload_name: upload_name.into(),
            upload_mime_type: upload_mime_type.into(),
            size,
            error,
        }
    }

    /// Stores `data` in a temporary file and describes it.
    pub(crate) async fn store(
        upload_name: String,
        upload_mime_type: String,
        data: Bytes,
        limits: &BodyLimits,
    ) -> Self {
        let size = data.len() as u64;
        if upload_name.is_empty() && data.is_empty() {
            return Self::failed(upload_name, upload_mime_type, 0, UploadErrorCode::NoFile);
        }
        if data.len() > limits.max_file_size {
            return Self::failed(upload_name, upload_mime_type, size, UploadErrorCode::IniSize);
        }

        let dir = limits.upload_dir.clone();
        let written = tokio::task::spawn_blocking(move || write_temp(dir.as_deref(), &data)).await;

        match written {
            Ok(Ok(temp)) => Self {
                temp: Some(Arc::new(temp)),
                upload_name,
                upload_mime_type,
                size,
                error: UploadErrorCode::Ok,
            },
            Ok(Err(err)) => {
                tracing::warn!(error = %err, file = %upload_name, "failed to store upload");
                Self::failed(upload_name, upload_mime_type, size, UploadErrorCode::CantWrite)
            }
            Err(err) => {
                tracing::warn!(error = %err, file = %upload_name, "upload writer task failed");
                Self::failed(upload_name, upload_mime_type, size, UploadErrorCode::CantWrite)
            }
        }
    }

    /// Returns the temporary path, `None` for failed uploads.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.temp.as_deref().map(|temp| &**temp)
    }

    /// Returns the file name sent by the client.
    #[must_use]
    pub fn upload_name(&self) -> &str {
        &self.upload_name
    }

    /// Returns the content type sent by the client.
    #[must_use]
    pub fn upload_mime_type(&self) -> &str {
        &self.upload_mime_type
    }

    /// Returns the extension of the client file name, without the dot.
    #[must_use]
    pub fn upload_extension(&self) -> Option<&str> {
        Path::new(&self.upload_name)
            .extension()
            .and_then(|ext| ext.to_str())
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the upload status.
    #[must_use]
    pub const fn error(&self) -> UploadErrorCode {
        self.error
    }

    /// Returns `true` when the upload succeeded and its content is on disk.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error == UploadErrorCode::Ok && self.temp.is_some()
    }

    /// Copies the upload to `destination`, creating parent directories.
    pub fn move_to(&self, destination: impl AsRef<Path>) -> TesseraResult<PathBuf> {
        let destination = destination.as_ref();
        let source = self
            .path()
            .ok_or_else(|| TesseraError::file_not_found(&self.upload_name))?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| TesseraError::file(parent.display(), err))?;
        }
        std::fs::copy(source, destination)
            .map_err(|err| TesseraError::file(destination.display(), err))?;
        Ok(destination.to_path_buf())
    }
}

fn write_temp(dir: Option<&Path>, data: &[u8]) -> std::io::Result<TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("tessera-upload-");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(data)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// The uploads submitted under one root field name.
///
/// # Example
///
/// ```
/// use tessera_http::{FileInput, UploadErrorCode, UploadFile};
///
/// let single = FileInput::Single(UploadFile::failed("a.txt", "text/plain", 0, UploadErrorCode::NoFile));
/// assert_eq!(single.files().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub enum FileInput {
    /// `avatar`
    Single(UploadFile),
    /// `photos[]`
    Many(Vec<FileInput>),
    /// `docs[front]`
    Named(IndexMap<String, FileInput>),
}

impl FileInput {
    pub(crate) fn build(path: &[FieldSegment], file: UploadFile) -> Self {
        match path.split_first() {
            None => Self::Single(file),
            Some((FieldSegment::Push, rest)) => Self::Many(vec![Self::build(rest, file)]),
            Some((FieldSegment::Key(key), rest)) => {
                let mut entries = IndexMap::new();
                entries.insert(key.clone(), Self::build(rest, file));
                Self::Named(entries)
            }
        }
    }

    pub(crate) fn insert(&mut self, path: &[FieldSegment], file: UploadFile) {
        match path.split_first() {
            None => *self = Self::Single(file),
            Some((FieldSegment::Push, rest)) => match self {
                Self::Many(items) => items.push(Self::build(rest, file)),
                _ => *self = Self::Many(vec![Self::build(rest, file)]),
            },
            Some((FieldSegment::Key(key), rest)) => match self {
                Self::Named(entries) => match entries.get_mut(key) {
                    Some(child) => child.insert(rest, file),
                    None => {
                        entries.insert(key.clone(), Self::build(rest, file));
                    }
                },
                _ => *self = Self::build(path, file),
            },
        }
    }

    /// Returns the upload if this is a single file.
    #[must_use]
    pub fn as_single(&self) -> Option<&UploadFile> {
        match self {
            Self::Single(file) => Some(file),
            _ => None,
        }
    }

    /// Returns the entry under `key` of a named group.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FileInput> {
        match self {
            Self::Named(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Returns every upload below this node, depth first.
    #[must_use]
    pub fn files(&self) -> Vec<&UploadFile> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a UploadFile>) {
        match self {
            Self::Single(file) => out.push(file),
            Self::Many(items) => items.iter().for_each(|item| item.collect(out)),
            Self::Named(entries) => entries.values().for_each(|item| item.collect(out)),
        }
    }
}
