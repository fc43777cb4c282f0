#![deny(unsafe_code)]

/// Chat client state for MaddyBot.
///
/// Every component is plain state owned by [`ChatController`], so the whole
/// send pipeline runs without a display attached.
pub mod controller;
pub mod error;
/// Transcript serialization to a standalone HTML page.
pub mod export;
/// Image preview decoding.
pub mod images;
pub mod input;
/// Domain entities shown in the transcript.
pub mod message;
/// Send lifecycle state and the fixed texts it produces.
pub mod pipeline;
pub mod staging;
pub mod transcript;
/// Speech-to-text capture wrapper.
pub mod voice;

pub use controller::{
    ChatController, Completion, ControllerConfig, DEFAULT_BOT_NAME, DEFAULT_USER_NAME,
    PendingSend,
};
pub use error::{ChatError, ChatResult};
pub use images::{
    DecodedImage, DecodedJob, ImageDecoder, ImageJob, ImagePreview, RasterDecoder, decode_job,
    decode_jobs,
};
pub use input::MessageInput;
pub use message::{Attachments, AudioRef, FileRef, ImageRef, ImageSource, Message, MessageId};
pub use pipeline::{CompletionRejection, SendOutcome, SendRejection, SendState, SendTicket};
pub use staging::{Chip, ChipKind, DEFAULT_MAX_UPLOAD_BYTES, UploadStaging};
pub use transcript::{Appended, RenderedMessage, ScrollAnchor, TranscriptItem, TranscriptView};
pub use voice::{
    RecognitionErrorKind, RecognitionEvent, RecognitionResult, SpeechRecognizer, VoiceCapture,
    VoiceToggle, VoiceUpdate,
};
