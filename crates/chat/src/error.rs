use std::path::PathBuf;

use maddy_client::ClientError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ChatError {
    #[snafu(display("failed to read image '{name}' on `{stage}`: {source}"))]
    ReadImage {
        stage: &'static str,
        name: String,
        source: ClientError,
    },
    #[snafu(display("image '{name}' is not valid base64 on `{stage}`: {source}"))]
    DecodeBase64 {
        stage: &'static str,
        name: String,
        source: base64::DecodeError,
    },
    #[snafu(display("failed to decode image '{name}' on `{stage}`: {source}"))]
    DecodeImage {
        stage: &'static str,
        name: String,
        source: image::ImageError,
    },
    #[snafu(display("image decode task for '{name}' did not finish: {details}"))]
    DecodeTask {
        stage: &'static str,
        name: String,
        details: String,
    },
    #[snafu(display("failed to write transcript to {path:?} on `{stage}`: {source}"))]
    WriteTranscript {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ChatError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ReadImage { stage, .. }
            | Self::DecodeBase64 { stage, .. }
            | Self::DecodeImage { stage, .. }
            | Self::DecodeTask { stage, .. }
            | Self::WriteTranscript { stage, .. } => stage,
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
