use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::stream::FuturesUnordered;
use maddy_client::{BoxFuture, StagedFile};
use snafu::ResultExt;

use crate::error::{
    ChatResult, DecodeBase64Snafu, DecodeImageSnafu, DecodeTaskSnafu, ReadImageSnafu,
};
use crate::message::MessageId;

/// A decoded image ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub mime: &'static str,
    pub bytes: Arc<[u8]>,
}

impl DecodedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// What the transcript shows for one image attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePreview {
    Ready { name: String, image: DecodedImage },
    /// Fallback placeholder for a server image that failed to decode.
    Broken { name: String },
}

impl ImagePreview {
    pub fn name(&self) -> &str {
        match self {
            Self::Ready { name, .. } | Self::Broken { name } => name,
        }
    }
}

pub trait ImageDecoder: Send + Sync {
    /// Reads and decodes a locally picked image.
    fn decode_raw<'a>(&'a self, file: &'a StagedFile) -> BoxFuture<'a, ChatResult<DecodedImage>>;

    /// Decodes a server-echoed image inline.
    fn decode_base64(&self, name: &str, encoded: &str) -> ChatResult<DecodedImage>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl RasterDecoder {
    fn decode_bytes(name: &str, bytes: Vec<u8>) -> ChatResult<DecodedImage> {
        let format = image::guess_format(&bytes).context(DecodeImageSnafu {
            stage: "guess-image-format",
            name: name.to_string(),
        })?;
        let decoded = image::load_from_memory_with_format(&bytes, format).context(
            DecodeImageSnafu {
                stage: "decode-image",
                name: name.to_string(),
            },
        )?;

        Ok(DecodedImage {
            width: decoded.width(),
            height: decoded.height(),
            mime: format.to_mime_type(),
            bytes: bytes.into(),
        })
    }

    async fn decode_file(file: &StagedFile) -> ChatResult<DecodedImage> {
        let name = file.name().to_string();
        let bytes = file.read().await.context(ReadImageSnafu {
            stage: "read-raw-image",
            name: name.clone(),
        })?;

        let task_name = name.clone();
        tokio::task::spawn_blocking(move || Self::decode_bytes(&task_name, bytes))
            .await
            .map_err(|error| {
                DecodeTaskSnafu {
                    stage: "join-image-decode",
                    name,
                    details: error.to_string(),
                }
                .build()
            })?
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode_raw<'a>(&'a self, file: &'a StagedFile) -> BoxFuture<'a, ChatResult<DecodedImage>> {
        Box::pin(Self::decode_file(file))
    }

    fn decode_base64(&self, name: &str, encoded: &str) -> ChatResult<DecodedImage> {
        let payload = strip_data_uri(encoded.trim());
        let bytes = STANDARD.decode(payload).context(DecodeBase64Snafu {
            stage: "decode-base64-image",
            name: name.to_string(),
        })?;
        Self::decode_bytes(name, bytes)
    }
}

fn strip_data_uri(encoded: &str) -> &str {
    if !encoded.starts_with("data:") {
        return encoded;
    }
    encoded
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .unwrap_or(encoded)
}

/// A raw image waiting to be decoded and attached to its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub message_id: MessageId,
    pub file: StagedFile,
}

#[derive(Debug)]
pub struct DecodedJob {
    pub message_id: MessageId,
    pub name: String,
    pub result: ChatResult<DecodedImage>,
}

pub fn decode_job(decoder: Arc<dyn ImageDecoder>, job: ImageJob) -> BoxFuture<'static, DecodedJob> {
    Box::pin(async move {
        let result = decoder.decode_raw(&job.file).await;
        DecodedJob {
            message_id: job.message_id,
            name: job.file.name().to_string(),
            result,
        }
    })
}

/// Starts every decode at once. The set yields in completion order, not
/// submission order.
pub fn decode_jobs(
    decoder: Arc<dyn ImageDecoder>,
    jobs: impl IntoIterator<Item = ImageJob>,
) -> FuturesUnordered<BoxFuture<'static, DecodedJob>> {
    jobs.into_iter()
        .map(|job| decode_job(Arc::clone(&decoder), job))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat};

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(3, 2)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn base64_images_decode_inline() {
        let encoded = STANDARD.encode(png_bytes());
        let image = RasterDecoder
            .decode_base64("chart.png", &encoded)
            .expect("decode");
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.mime, "image/png");
        assert!(image.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn data_uri_prefix_is_accepted() {
        let encoded = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        assert!(RasterDecoder.decode_base64("chart.png", &encoded).is_ok());
    }

    #[test]
    fn corrupt_base64_reports_the_stage() {
        let error = RasterDecoder
            .decode_base64("x.png", "!!not base64!!")
            .expect_err("invalid");
        assert_eq!(error.stage(), "decode-base64-image");

        let not_an_image = STANDARD.encode(b"plain text");
        let error = RasterDecoder
            .decode_base64("x.png", &not_an_image)
            .expect_err("not an image");
        assert_eq!(error.stage(), "guess-image-format");
    }

    #[tokio::test]
    async fn raw_images_are_read_then_decoded() {
        let file = StagedFile::from_bytes("dot.png", png_bytes());
        let image = RasterDecoder.decode_raw(&file).await.expect("decode");
        assert_eq!(image.width, 3);

        let broken = StagedFile::from_bytes("broken.png", b"\x89PNG\r\n\x1a\nnope".to_vec());
        assert!(RasterDecoder.decode_raw(&broken).await.is_err());
    }
}
