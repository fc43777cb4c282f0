use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Url;
use reqwest::multipart::{Form, Part};
use snafu::{ResultExt, ensure};

use crate::error::{
    AttachmentMimeSnafu, BuildHttpClientSnafu, BuildRequestSnafu, ClientError, ClientResult,
    ReadBodySnafu, SendSnafu, TimeoutSnafu, UnsupportedSchemeSnafu,
};
use crate::request::{
    CHAT_PATH, ChatRequest, ChatResponse, FILES_FIELD, IMAGES_FIELD, JsonBody, MESSAGE_FIELD,
};
use crate::staged::StagedFile;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            timeout,
        }
    }

    /// Resolves the chat endpoint against the base URL.
    pub fn chat_url(&self) -> ClientResult<Url> {
        let base = if self.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            self.base_url.as_str()
        };

        let url = Url::parse(base)
            .and_then(|base| base.join(CHAT_PATH))
            .map_err(|error| ClientError::InvalidEndpoint {
                stage: "resolve-chat-url",
                endpoint: base.to_string(),
                details: error.to_string(),
            })?;

        ensure!(
            matches!(url.scheme(), "http" | "https"),
            UnsupportedSchemeSnafu {
                stage: "check-chat-url-scheme",
                endpoint: base,
                scheme: url.scheme(),
            }
        );
        Ok(url)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }
}

/// Issues exactly one chat request per call and interprets the response.
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;
    fn send<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ClientResult<ChatResponse>>;
}

pub struct HttpChatTransport {
    client: reqwest::Client,
    chat_url: Url,
}

impl HttpChatTransport {
    pub fn new(config: &TransportConfig) -> ClientResult<Self> {
        let chat_url = config.chat_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context(BuildHttpClientSnafu {
                stage: "build-http-client",
            })?;

        tracing::debug!(chat_url = %chat_url, timeout = ?config.timeout, "http chat transport ready");
        Ok(Self { client, chat_url })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    /// Builds the HTTP request, reading attachment bytes for multipart bodies.
    pub async fn build_request(&self, request: &ChatRequest) -> ClientResult<reqwest::Request> {
        let builder = self.client.post(self.chat_url.clone());
        let builder = match request {
            ChatRequest::Json { message } => builder.json(&JsonBody { message }),
            ChatRequest::Multipart {
                message,
                files,
                images,
            } => {
                let mut form = Form::new().text(MESSAGE_FIELD, message.clone());
                for file in files {
                    form = form.part(FILES_FIELD, Self::file_part(file).await?);
                }
                for image in images {
                    form = form.part(IMAGES_FIELD, Self::file_part(image).await?);
                }
                builder.multipart(form)
            }
        };

        builder.build().context(BuildRequestSnafu {
            stage: "build-chat-request",
        })
    }

    async fn file_part(file: &StagedFile) -> ClientResult<Part> {
        let bytes = file.read().await?;
        Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())
            .context(AttachmentMimeSnafu {
                stage: "attach-multipart-part",
                name: file.name().to_string(),
            })
    }

    async fn execute(&self, request: ChatRequest) -> ClientResult<ChatResponse> {
        tracing::info!(
            chat_url = %self.chat_url,
            multipart = request.is_multipart(),
            attachments = request.attachment_count(),
            "sending chat request"
        );

        let http_request = self.build_request(&request).await?;
        let response = self.client.execute(http_request).await.context(SendSnafu {
            stage: "send-chat-request",
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.context(ReadBodySnafu {
            stage: "read-chat-response",
        })?;

        tracing::debug!(status, body_len = body.len(), "chat response received");
        ChatResponse::from_parts(status, &body)
    }
}

/// Sends through any transport, reporting a hung exchange as a timeout.
pub async fn send_with_timeout(
    transport: &dyn ChatTransport,
    request: ChatRequest,
    after: Duration,
) -> ClientResult<ChatResponse> {
    match tokio::time::timeout(after, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(transport = transport.name(), ?after, "chat request timed out");
            TimeoutSnafu {
                stage: "await-chat-response",
                after,
            }
            .fail()
        }
    }
}

impl ChatTransport for HttpChatTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn send<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ClientResult<ChatResponse>> {
        Box::pin(self.execute(request))
    }
}
