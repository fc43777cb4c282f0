#![deny(unsafe_code)]

/// HTTP client for the MaddyBot chat endpoint.
///
/// Requests are JSON when nothing is attached and multipart otherwise.
pub mod error;
pub mod request;
/// Files picked for upload whose bytes are read at send time.
pub mod staged;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use request::{CHAT_PATH, ChatRequest, ChatResponse};
pub use staged::{FileSource, StagedFile};
pub use transport::{
    BoxFuture, ChatTransport, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpChatTransport,
    TransportConfig, send_with_timeout,
};
