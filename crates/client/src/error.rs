use std::path::PathBuf;
use std::time::Duration;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("chat endpoint '{endpoint}' is not a valid URL: {details}"))]
    InvalidEndpoint {
        stage: &'static str,
        endpoint: String,
        details: String,
    },
    #[snafu(display("chat endpoint '{endpoint}' uses unsupported scheme '{scheme}'"))]
    UnsupportedScheme {
        stage: &'static str,
        endpoint: String,
        scheme: String,
    },
    #[snafu(display("failed to build HTTP client on `{stage}`: {source}"))]
    BuildHttpClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read attachment {path:?} on `{stage}`: {source}"))]
    ReadAttachment {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("attachment '{name}' has an unusable content type on `{stage}`: {source}"))]
    AttachmentMime {
        stage: &'static str,
        name: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to build chat request on `{stage}`: {source}"))]
    BuildRequest {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("chat request failed on `{stage}`: {source}"))]
    Send {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read chat response body on `{stage}`: {source}"))]
    ReadBody {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("chat response with status {status} is not valid JSON: {source}"))]
    DecodeReply {
        stage: &'static str,
        status: u16,
        source: serde_json::Error,
    },
    #[snafu(display("chat request did not complete within {after:?}"))]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
}

impl ClientError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint { stage, .. }
            | Self::UnsupportedScheme { stage, .. }
            | Self::BuildHttpClient { stage, .. }
            | Self::ReadAttachment { stage, .. }
            | Self::AttachmentMime { stage, .. }
            | Self::BuildRequest { stage, .. }
            | Self::Send { stage, .. }
            | Self::ReadBody { stage, .. }
            | Self::DecodeReply { stage, .. }
            | Self::Timeout { stage, .. } => stage,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Send { source, .. } | Self::ReadBody { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
