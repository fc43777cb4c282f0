use std::path::{Path, PathBuf};
use std::sync::Arc;

use snafu::ResultExt;

use crate::error::{ClientResult, ReadAttachmentSnafu};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Where the bytes of a staged file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Disk(PathBuf),
    Memory(Arc<[u8]>),
}

/// A file handle picked by the user and not yet uploaded.
///
/// Reading is deferred until the file is actually sent or previewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    name: String,
    source: FileSource,
    size: u64,
}

impl StagedFile {
    /// Wraps in-memory content under a display name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Arc<[u8]> = bytes.into().into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// Opens a handle to a file on disk. Only metadata is read here.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path)
            .await
            .context(ReadAttachmentSnafu {
                stage: "stat-staged-file",
                path: path.clone(),
            })?;

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Disk(path),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Lower-cased extension of the display name, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
    }

    pub fn is_image(&self) -> bool {
        image::ImageFormat::from_path(&self.name).is_ok()
    }

    pub fn mime_type(&self) -> &'static str {
        if let Ok(format) = image::ImageFormat::from_path(&self.name) {
            return format.to_mime_type();
        }

        match self.extension().as_deref() {
            Some("txt" | "log") => "text/plain",
            Some("md") => "text/markdown",
            Some("py") => "text/x-python",
            Some("js") => "text/javascript",
            Some("html") => "text/html",
            Some("css") => "text/css",
            Some("csv") => "text/csv",
            Some("json") => "application/json",
            Some("xml") => "application/xml",
            Some("pdf") => "application/pdf",
            Some("doc") => "application/msword",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Some("xls") => "application/vnd.ms-excel",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            _ => FALLBACK_MIME,
        }
    }

    pub async fn read(&self) -> ClientResult<Vec<u8>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Disk(path) => tokio::fs::read(path).await.context(ReadAttachmentSnafu {
                stage: "read-staged-file",
                path: path.clone(),
            }),
        }
    }
}
