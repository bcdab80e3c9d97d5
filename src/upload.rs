use actix_multipart::Multipart;
use async_trait::async_trait;
use futures::TryStreamExt;
use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::error::AppError;

/// Multipart field that carries the upload.
pub const UPLOAD_FIELD: &str = "file";

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    "txt", "csv", "zip",
];

/// Stores uploaded bytes and hands back an opaque reference to them.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// `extension` is already validated and lowercase, without the dot.
    async fn put(&self, extension: &str, bytes: Vec<u8>) -> Result<String, AppError>;
}

/// Writes blobs as `file-<unix millis>-<random>.<ext>` under a directory.
pub struct LocalBlobStore {
    root: PathBuf,
    clock: std::sync::Arc<dyn Clock>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, clock: std::sync::Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, extension: &str, bytes: Vec<u8>) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let name = format!(
            "file-{}-{}.{}",
            self.clock.now().timestamp_millis(),
            rand::random::<u32>() % 1_000_000_000,
            extension
        );
        tokio::fs::write(self.root.join(&name), bytes).await?;
        log::info!("Stored upload {} ({})", name, self.root.display());
        Ok(name)
    }
}

/// Lowercase extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Result<String, AppError> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported file type: {}", filename)))
}

/// An accepted upload read fully into memory.
#[derive(Debug)]
pub struct ReceivedFile {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Pulls the `file` field out of a multipart body.
///
/// Fails with `BadRequest` if the field is absent, the extension is not allowed,
/// or the content grows past `max_bytes`. Other fields are drained and ignored.
pub async fn receive_file(mut payload: Multipart, max_bytes: usize) -> Result<ReceivedFile, AppError> {
    let mut received = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let disposition = field.content_disposition();
        let is_upload = disposition.get_name() == Some(UPLOAD_FIELD) && received.is_none();
        let filename = disposition.get_filename().map(str::to_string);

        if !is_upload {
            while field
                .try_next()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?
                .is_some()
            {}
            continue;
        }

        let filename =
            filename.ok_or_else(|| AppError::BadRequest("File is required".into()))?;
        let extension = allowed_extension(&filename)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::BadRequest(format!(
                    "File too large: limit is {} bytes",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        received = Some(ReceivedFile { extension, bytes });
    }

    received.ok_or_else(|| AppError::BadRequest("File is required".into()))
}
