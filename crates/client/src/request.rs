use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{ClientResult, DecodeReplySnafu};
use crate::staged::StagedFile;

/// Path of the single chat endpoint relative to the configured base URL.
pub const CHAT_PATH: &str = "/api/chat";

/// Multipart field carrying the message text.
pub const MESSAGE_FIELD: &str = "message";
/// Repeated multipart field carrying documents.
pub const FILES_FIELD: &str = "files";
/// Repeated multipart field carrying image blobs.
pub const IMAGES_FIELD: &str = "images";

/// One `POST /api/chat` request in the encoding it will be sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRequest {
    /// `{"message": ...}` when nothing is attached.
    Json { message: String },
    /// Form body with the message plus every staged file and image.
    Multipart {
        message: String,
        files: Vec<StagedFile>,
        images: Vec<StagedFile>,
    },
}

impl ChatRequest {
    /// Picks the encoding from the attachments: any attachment forces multipart.
    pub fn new(message: impl Into<String>, files: Vec<StagedFile>, images: Vec<StagedFile>) -> Self {
        let message = message.into();
        if files.is_empty() && images.is_empty() {
            Self::Json { message }
        } else {
            Self::Multipart {
                message,
                files,
                images,
            }
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Json { message } | Self::Multipart { message, .. } => message,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }

    pub fn attachment_count(&self) -> usize {
        match self {
            Self::Json { .. } => 0,
            Self::Multipart { files, images, .. } => files.len() + images.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonBody<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    #[serde(default)]
    reply: Option<String>,
}

/// Interpreted response of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub status: u16,
    /// Reply on success, or the server's explanation on failure.
    pub reply: Option<String>,
}

impl ChatResponse {
    pub fn success(reply: impl Into<String>) -> Self {
        Self {
            status: 200,
            reply: Some(reply.into()),
        }
    }

    pub fn failure(status: u16, explanation: Option<String>) -> Self {
        Self {
            status,
            reply: explanation,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes a raw status and body.
    ///
    /// A 2xx body must be JSON, otherwise the exchange counts as a transport
    /// failure. Error bodies are read leniently: anything without a string
    /// `reply` simply carries no explanation.
    pub fn from_parts(status: u16, body: &str) -> ClientResult<Self> {
        let success = (200..300).contains(&status);
        if success {
            let parsed: ReplyBody = serde_json::from_str(body).context(DecodeReplySnafu {
                stage: "decode-chat-reply",
                status,
            })?;
            return Ok(Self {
                status,
                reply: parsed.reply,
            });
        }

        let explanation = serde_json::from_str::<ReplyBody>(body)
            .ok()
            .and_then(|parsed| parsed.reply)
            .filter(|reply| !reply.trim().is_empty());

        Ok(Self::failure(status, explanation))
    }
}
