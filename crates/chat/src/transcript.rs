use std::sync::Arc;

use crate::images::{DecodedJob, ImageDecoder, ImageJob, ImagePreview};
use crate::message::{Attachments, AudioRef, ImageSource, Message, MessageId};

/// Shown while the transcript has no messages.
pub const EMPTY_PLACEHOLDER: &str = "No messages yet. Say hello!";
/// Animated marker of the typing indicator.
pub const TYPING_MARKER: &str = "...";

/// A message with its body rendered and its previews resolved so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub message: Message,
    pub html: String,
    /// Previews in insertion order. Raw images land here as their decodes finish.
    pub images: Vec<ImagePreview>,
    pub files: Vec<String>,
    pub audio: Option<AudioRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptItem {
    Message(RenderedMessage),
    /// Reserved slot for the bot typing indicator.
    Typing { author: String },
}

impl TranscriptItem {
    fn anchor(&self) -> ScrollAnchor {
        match self {
            Self::Message(rendered) => ScrollAnchor::Message(rendered.message.id),
            Self::Typing { .. } => ScrollAnchor::Typing,
        }
    }
}

/// Item the view is scrolled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAnchor {
    Message(MessageId),
    Typing,
}

/// Result of appending one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    pub id: MessageId,
    /// Raw images that still need an asynchronous decode.
    pub jobs: Vec<ImageJob>,
}

/// Ordered, append-only message log.
pub struct TranscriptView {
    items: Vec<TranscriptItem>,
    placeholder_visible: bool,
    next_message_id: u64,
    scroll_anchor: Option<ScrollAnchor>,
    decoder: Arc<dyn ImageDecoder>,
}

impl TranscriptView {
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            items: Vec::new(),
            placeholder_visible: true,
            next_message_id: 1,
            scroll_anchor: None,
            decoder,
        }
    }

    pub fn append_message(
        &mut self,
        author: &str,
        text: &str,
        is_user: bool,
        attachments: Option<Attachments>,
    ) -> Appended {
        let id = self.alloc_message_id();
        let message = Message::new(id, author, text, is_user, attachments);

        let mut images = Vec::new();
        let mut jobs = Vec::new();
        let mut files = Vec::new();
        let mut audio = None;
        if let Some(attachments) = &message.attachments {
            for image in &attachments.images {
                match &image.source {
                    ImageSource::Raw(file) => jobs.push(ImageJob {
                        message_id: id,
                        file: file.clone(),
                    }),
                    ImageSource::Base64(encoded) => {
                        images.push(self.decode_inline(&image.name, encoded));
                    }
                }
            }
            files = attachments
                .files
                .iter()
                .map(|file| file.name.clone())
                .collect();
            audio = attachments.audio.clone();
        }

        let html = maddy_markdown::render(&message.text);
        self.placeholder_visible = false;
        self.items.push(TranscriptItem::Message(RenderedMessage {
            message,
            html,
            images,
            files,
            audio,
        }));
        self.scroll_to_newest();

        tracing::debug!(message_id = id.0, is_user, pending_images = jobs.len(), "message appended");
        Appended { id, jobs }
    }

    /// Inserts a finished raw-image decode into its message. Failed decodes
    /// are logged and skipped.
    pub fn attach_image(&mut self, decoded: DecodedJob) -> bool {
        let image = match decoded.result {
            Ok(image) => image,
            Err(error) => {
                tracing::warn!(
                    message_id = decoded.message_id.0,
                    name = %decoded.name,
                    error = %error,
                    "image preview unavailable"
                );
                return false;
            }
        };

        let Some(rendered) = self.message_mut(decoded.message_id) else {
            tracing::warn!(message_id = decoded.message_id.0, "image decoded for unknown message");
            return false;
        };
        rendered.images.push(ImagePreview::Ready {
            name: decoded.name,
            image,
        });
        self.scroll_to_newest();
        true
    }

    /// Shows the typing indicator unless one already exists.
    pub fn show_typing_indicator(&mut self, author: &str) -> bool {
        if self.has_typing_indicator() {
            return false;
        }
        self.items.push(TranscriptItem::Typing {
            author: author.to_string(),
        });
        self.scroll_to_newest();
        true
    }

    pub fn remove_typing_indicator(&mut self) -> bool {
        let Some(position) = self
            .items
            .iter()
            .position(|item| matches!(item, TranscriptItem::Typing { .. }))
        else {
            return false;
        };
        self.items.remove(position);
        true
    }

    pub fn has_typing_indicator(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, TranscriptItem::Typing { .. }))
    }

    pub fn items(&self) -> &[TranscriptItem] {
        &self.items
    }

    pub fn messages(&self) -> impl Iterator<Item = &RenderedMessage> {
        self.items.iter().filter_map(|item| match item {
            TranscriptItem::Message(rendered) => Some(rendered),
            TranscriptItem::Typing { .. } => None,
        })
    }

    pub fn message(&self, id: MessageId) -> Option<&RenderedMessage> {
        self.messages().find(|rendered| rendered.message.id == id)
    }

    pub fn message_count(&self) -> usize {
        self.messages().count()
    }

    pub fn is_placeholder_visible(&self) -> bool {
        self.placeholder_visible
    }

    pub fn scroll_anchor(&self) -> Option<ScrollAnchor> {
        self.scroll_anchor
    }

    fn decode_inline(&self, name: &str, encoded: &str) -> ImagePreview {
        match self.decoder.decode_base64(name, encoded) {
            Ok(image) => ImagePreview::Ready {
                name: name.to_string(),
                image,
            },
            Err(error) => {
                tracing::warn!(name, error = %error, "server image failed to decode");
                ImagePreview::Broken {
                    name: name.to_string(),
                }
            }
        }
    }

    fn message_mut(&mut self, id: MessageId) -> Option<&mut RenderedMessage> {
        self.items.iter_mut().find_map(|item| match item {
            TranscriptItem::Message(rendered) if rendered.message.id == id => Some(rendered),
            _ => None,
        })
    }

    fn scroll_to_newest(&mut self) {
        self.scroll_anchor = self.items.last().map(TranscriptItem::anchor);
    }

    fn alloc_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id = self.next_message_id.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image::{DynamicImage, ImageFormat};
    use maddy_client::StagedFile;

    use super::*;
    use crate::images::{DecodedImage, RasterDecoder};
    use crate::message::{FileRef, ImageRef};

    fn view() -> TranscriptView {
        TranscriptView::new(Arc::new(RasterDecoder))
    }

    fn png_base64() -> String {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(1, 1)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        STANDARD.encode(bytes)
    }

    #[test]
    fn first_message_removes_placeholder_and_scrolls() {
        let mut transcript = view();
        assert!(transcript.is_placeholder_visible());

        let appended = transcript.append_message("You", "**hi**", true, None);
        assert!(!transcript.is_placeholder_visible());
        assert_eq!(transcript.scroll_anchor(), Some(ScrollAnchor::Message(appended.id)));

        let rendered = transcript.message(appended.id).expect("message");
        assert_eq!(rendered.html, "<p><strong>hi</strong></p>");
    }

    #[test]
    fn typing_indicator_is_a_single_slot() {
        let mut transcript = view();
        assert!(transcript.show_typing_indicator("MaddyBot"));
        assert!(!transcript.show_typing_indicator("MaddyBot"));
        assert_eq!(transcript.items().len(), 1);
        assert_eq!(transcript.scroll_anchor(), Some(ScrollAnchor::Typing));
        // The indicator is not a message.
        assert!(transcript.is_placeholder_visible());

        assert!(transcript.remove_typing_indicator());
        assert!(!transcript.remove_typing_indicator());
        assert!(transcript.items().is_empty());
    }

    #[test]
    fn attachments_render_before_text() {
        let mut transcript = view();
        let attachments = Attachments {
            images: vec![
                ImageRef::base64("ok.png", png_base64()),
                ImageRef::base64("bad.png", "???"),
                ImageRef::raw(StagedFile::from_bytes("local.png", vec![1_u8])),
            ],
            files: vec![FileRef::new("report.pdf")],
            audio: None,
        };

        let appended = transcript.append_message("MaddyBot", "done", false, Some(attachments));
        let rendered = transcript.message(appended.id).expect("message");

        assert!(matches!(rendered.images[0], ImagePreview::Ready { .. }));
        assert_eq!(
            rendered.images[1],
            ImagePreview::Broken {
                name: "bad.png".to_string()
            }
        );
        assert_eq!(rendered.images.len(), 2);
        assert_eq!(rendered.files, ["report.pdf"]);
        assert_eq!(appended.jobs.len(), 1);
        assert_eq!(appended.jobs[0].file.name(), "local.png");
    }

    #[test]
    fn decoded_raw_images_attach_and_failures_are_skipped() {
        let mut transcript = view();
        let appended = transcript.append_message("You", "", true, None);
        let image = DecodedImage {
            width: 1,
            height: 1,
            mime: "image/png",
            bytes: Arc::from(vec![0_u8]),
        };

        assert!(transcript.attach_image(DecodedJob {
            message_id: appended.id,
            name: "a.png".to_string(),
            result: Ok(image.clone()),
        }));
        assert!(!transcript.attach_image(DecodedJob {
            message_id: MessageId::new(99),
            name: "b.png".to_string(),
            result: Ok(image),
        }));

        let broken = RasterDecoder.decode_base64("c.png", "???").expect_err("invalid");
        assert!(!transcript.attach_image(DecodedJob {
            message_id: appended.id,
            name: "c.png".to_string(),
            result: Err(broken),
        }));

        let rendered = transcript.message(appended.id).expect("message");
        let names: Vec<_> = rendered.images.iter().map(ImagePreview::name).collect();
        assert_eq!(names, ["a.png"]);
    }
}
