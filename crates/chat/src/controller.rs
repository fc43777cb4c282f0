use std::sync::Arc;
use std::time::Duration;

use maddy_client::{ChatRequest, ChatResponse, ChatTransport, ClientResult, StagedFile};

use crate::images::{DecodedJob, ImageDecoder, ImageJob};
use crate::input::MessageInput;
use crate::message::Attachments;
use crate::pipeline::{
    ATTACHMENTS_CAPTION, CompletionRejection, SendOutcome, SendRejection, SendState, SendTicket,
};
use crate::staging::{DEFAULT_MAX_UPLOAD_BYTES, UploadStaging};
use crate::transcript::TranscriptView;
use crate::voice::{
    RecognitionEvent, SpeechRecognizer, UNAVAILABLE_MESSAGE, VoiceCapture, VoiceToggle,
    VoiceUpdate,
};

pub const DEFAULT_USER_NAME: &str = "You";
pub const DEFAULT_BOT_NAME: &str = "MaddyBot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub user_name: String,
    pub bot_name: String,
    pub max_upload_bytes: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// An accepted send whose request still has to go over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub ticket: SendTicket,
    pub request: ChatRequest,
}

/// Result of applying a finished request to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: SendOutcome,
    /// Raw images of the echoed user message, to be decoded and attached.
    pub jobs: Vec<ImageJob>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendOrigin {
    Form,
    Voice,
}

/// User message that is only appended once the server accepted the send.
#[derive(Debug, Clone)]
struct DeferredEcho {
    text: String,
    attachments: Attachments,
}

/// Coordinator-level metadata of the in-flight send.
#[derive(Debug, Clone)]
struct ActiveSend {
    ticket: SendTicket,
    echo: Option<DeferredEcho>,
}

/// Owns every chat component and runs the send pipeline between them.
pub struct ChatController {
    config: ControllerConfig,
    transcript: TranscriptView,
    staging: UploadStaging,
    input: MessageInput,
    voice: VoiceCapture,
    send_state: SendState,
    active_send: Option<ActiveSend>,
    next_ticket: u64,
    notice: Option<String>,
}

impl ChatController {
    pub fn new(
        config: ControllerConfig,
        decoder: Arc<dyn ImageDecoder>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
    ) -> Self {
        Self {
            config,
            transcript: TranscriptView::new(decoder),
            staging: UploadStaging::new(),
            input: MessageInput::new(),
            voice: VoiceCapture::new(recognizer),
            send_state: SendState::Idle,
            active_send: None,
            next_ticket: 1,
            notice: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    pub fn staging(&self) -> &UploadStaging {
        &self.staging
    }

    pub fn input(&self) -> &MessageInput {
        &self.input
    }

    pub fn voice(&self) -> &VoiceCapture {
        &self.voice
    }

    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    pub fn is_sending(&self) -> bool {
        self.send_state.is_sending()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn set_input(&mut self, value: impl Into<String>) -> bool {
        self.input.set_value(value)
    }

    /// Replaces the staged documents. Returns how many were accepted.
    pub fn set_files(&mut self, selection: Vec<StagedFile>) -> usize {
        let rejected = self.staging.set_files(selection);
        self.report_rejected("file", &rejected);
        self.staging.files().len()
    }

    /// Replaces the staged images. Returns how many were accepted.
    pub fn set_images(&mut self, selection: Vec<StagedFile>) -> usize {
        let rejected = self.staging.set_images(selection);
        self.report_rejected("image", &rejected);
        self.staging.images().len()
    }

    pub fn remove_file_at(&mut self, index: usize) -> Option<StagedFile> {
        self.staging.remove_file_at(index)
    }

    pub fn remove_image_at(&mut self, index: usize) -> Option<StagedFile> {
        self.staging.remove_image_at(index)
    }

    /// Submits the input form with whatever is currently staged.
    pub fn submit_form(&mut self) -> Result<PendingSend, SendRejection> {
        let message = self.input.value().trim().to_string();
        self.check_entry(&message)?;
        self.input.take_trimmed();
        self.begin_send(message, SendOrigin::Form)
    }

    /// Applies a finished request. Every accepted completion re-enables the
    /// controls and removes the typing indicator.
    pub fn finish_send(
        &mut self,
        ticket: SendTicket,
        result: ClientResult<ChatResponse>,
    ) -> Result<Completion, CompletionRejection> {
        let next_state = match self.send_state.finish(ticket) {
            Ok(next_state) => next_state,
            Err(rejection) => {
                tracing::debug!(ticket = ticket.0, ?rejection, "ignoring stale send completion");
                return Err(rejection);
            }
        };
        self.send_state = next_state;
        let echo = self.active_send.take().and_then(|active| active.echo);

        self.transcript.remove_typing_indicator();
        self.input.set_busy(false);

        let outcome = SendOutcome::from_result(&result);
        let mut jobs = Vec::new();
        match (&outcome, &result) {
            (SendOutcome::Replied { .. }, _) => {
                if let Some(echo) = echo {
                    let text = if echo.text.is_empty() {
                        ATTACHMENTS_CAPTION
                    } else {
                        echo.text.as_str()
                    };
                    let user_name = self.config.user_name.clone();
                    jobs = self
                        .transcript
                        .append_message(&user_name, text, true, Some(echo.attachments))
                        .jobs;
                }
                self.staging.clear();
                tracing::info!(ticket = ticket.0, "send completed");
            }
            (SendOutcome::Rejected { status, .. }, _) => {
                tracing::warn!(ticket = ticket.0, status, "chat server rejected the send");
            }
            (SendOutcome::TransportFailed, Err(error)) => {
                tracing::warn!(
                    ticket = ticket.0,
                    stage = error.stage(),
                    timeout = error.is_timeout(),
                    error = %error,
                    "chat request failed"
                );
            }
            (SendOutcome::TransportFailed, Ok(_)) => {}
        }

        let bot_name = self.config.bot_name.clone();
        self.transcript
            .append_message(&bot_name, outcome.bot_text(), false, None);

        Ok(Completion { outcome, jobs })
    }

    /// Sends and applies the result in one step, bounded by `timeout`.
    pub async fn dispatch(
        &mut self,
        pending: PendingSend,
        transport: &dyn ChatTransport,
        timeout: Duration,
    ) -> Result<Completion, CompletionRejection> {
        let result = maddy_client::send_with_timeout(transport, pending.request, timeout).await;
        self.finish_send(pending.ticket, result)
    }

    pub fn attach_image(&mut self, decoded: DecodedJob) -> bool {
        self.transcript.attach_image(decoded)
    }

    /// Starts or stops voice capture.
    pub fn toggle_voice(&mut self) -> VoiceToggle {
        let toggle = self.voice.toggle();
        match &toggle {
            VoiceToggle::Unavailable => self.notice = Some(UNAVAILABLE_MESSAGE.to_string()),
            VoiceToggle::Failed(kind) => self.notice = Some(kind.user_message()),
            VoiceToggle::Started | VoiceToggle::Stopping => {}
        }
        toggle
    }

    /// Feeds one recognizer event. A finished session with a transcript is
    /// appended and sent without going through the form.
    pub fn handle_voice_event(&mut self, event: RecognitionEvent) -> Option<PendingSend> {
        match self.voice.handle(event) {
            VoiceUpdate::Display(text) => {
                self.input.overwrite(text);
                None
            }
            VoiceUpdate::Failed(kind) => {
                self.notice = Some(kind.user_message());
                None
            }
            VoiceUpdate::Finished(Some(transcript)) => {
                if let Err(rejection) = self.check_entry(&transcript) {
                    // The transcript stays in the input for a manual retry.
                    tracing::warn!(?rejection, "voice transcript not sent");
                    self.input.overwrite(transcript);
                    return None;
                }
                self.input.clear();
                self.begin_send(transcript, SendOrigin::Voice).ok()
            }
            VoiceUpdate::Finished(None) | VoiceUpdate::Ignored => None,
        }
    }

    fn check_entry(&mut self, message: &str) -> Result<(), SendRejection> {
        if message.is_empty() && self.staging.is_empty() {
            return Err(SendRejection::NothingToSend);
        }
        if let Some(active) = self.send_state.active_ticket() {
            return Err(SendRejection::AlreadySending { active });
        }

        let total = self.staging.total_bytes();
        let limit = self.config.max_upload_bytes;
        if total > limit {
            self.notice = Some(format!(
                "Attachments are too large to send ({} MB, limit {} MB).",
                megabytes(total),
                megabytes(limit)
            ));
            return Err(SendRejection::UploadTooLarge { total, limit });
        }
        Ok(())
    }

    fn begin_send(
        &mut self,
        message: String,
        origin: SendOrigin,
    ) -> Result<PendingSend, SendRejection> {
        let ticket = SendTicket::new(self.next_ticket);
        self.send_state = self.send_state.begin(ticket)?;
        self.next_ticket = self.next_ticket.saturating_add(1);

        let has_attachments = !self.staging.is_empty();
        let attachments = Attachments::from_staged(self.staging.files(), self.staging.images());
        let echo = match (origin, has_attachments) {
            (SendOrigin::Form, true) => Some(DeferredEcho {
                text: message.clone(),
                attachments,
            }),
            (SendOrigin::Voice, true) => {
                self.append_user_text(&message);
                Some(DeferredEcho {
                    text: String::new(),
                    attachments,
                })
            }
            (_, false) => {
                self.append_user_text(&message);
                None
            }
        };
        self.active_send = Some(ActiveSend { ticket, echo });

        self.input.set_busy(true);
        let bot_name = self.config.bot_name.clone();
        self.transcript.show_typing_indicator(&bot_name);

        let request = ChatRequest::new(
            message,
            self.staging.files().to_vec(),
            self.staging.images().to_vec(),
        );
        tracing::info!(
            ticket = ticket.0,
            ?origin,
            multipart = request.is_multipart(),
            attachments = request.attachment_count(),
            "send started"
        );
        Ok(PendingSend { ticket, request })
    }

    fn append_user_text(&mut self, text: &str) {
        let user_name = self.config.user_name.clone();
        self.transcript.append_message(&user_name, text, true, None);
    }

    fn report_rejected(&mut self, kind: &str, rejected: &[String]) {
        if rejected.is_empty() {
            return;
        }
        tracing::warn!(kind, rejected = ?rejected, "unsupported attachments skipped");
        self.notice = Some(format!("Unsupported {kind} type: {}", rejected.join(", ")));
    }
}

fn megabytes(bytes: u64) -> u64 {
    bytes.div_ceil(1024 * 1024)
}
