use std::fmt;

/// Shown when speech ended without any words recognized.
pub const NO_SPEECH_MESSAGE: &str = "No speech was detected. Please try again.";
/// Shown when microphone access was refused.
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Microphone access was denied. Please allow microphone access and try again.";
/// Shown when voice input is triggered without a recognizer.
pub const UNAVAILABLE_MESSAGE: &str = "Speech recognition is not supported on this device.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NoSpeech,
    NotAllowed,
    ServiceNotAllowed,
    AudioCapture,
    Network,
    Aborted,
    Other(String),
}

impl RecognitionErrorKind {
    /// User-facing message for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoSpeech => NO_SPEECH_MESSAGE.to_string(),
            Self::NotAllowed | Self::ServiceNotAllowed => PERMISSION_DENIED_MESSAGE.to_string(),
            other => format!("Speech recognition error: {other}"),
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpeech => f.write_str("no-speech"),
            Self::NotAllowed => f.write_str("not-allowed"),
            Self::ServiceNotAllowed => f.write_str("service-not-allowed"),
            Self::AudioCapture => f.write_str("audio-capture"),
            Self::Network => f.write_str("network"),
            Self::Aborted => f.write_str("aborted"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// One recognition hypothesis delivered by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Results produced since the previous event.
    Results(Vec<RecognitionResult>),
    Error(RecognitionErrorKind),
    /// The capture stream closed.
    End,
}

/// Continuous speech-to-text capture stream.
///
/// Implementations deliver [`RecognitionEvent`]s to the owner of the
/// [`VoiceCapture`] after `start` succeeds, finishing with `End`.
pub trait SpeechRecognizer: Send {
    fn start(&mut self) -> Result<(), RecognitionErrorKind>;
    fn stop(&mut self);
}

/// Transient state of one start..end cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionSession {
    pub final_transcript: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceToggle {
    Started,
    /// Stop requested; the session closes when the recognizer reports `End`.
    Stopping,
    Unavailable,
    Failed(RecognitionErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceUpdate {
    /// New input field content: final text so far plus interim text.
    Display(String),
    /// Session ended; carries the final transcript when one was recognized.
    Finished(Option<String>),
    Failed(RecognitionErrorKind),
    /// Event arrived with no session open.
    Ignored,
}

/// `idle -> listening -> idle` wrapper around a [`SpeechRecognizer`].
pub struct VoiceCapture {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    session: Option<RecognitionSession>,
}

impl VoiceCapture {
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            session: None,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(None)
    }

    /// Detected once; frontends hide the trigger when this is false.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&RecognitionSession> {
        self.session.as_ref()
    }

    /// Starts listening, or stops when already listening.
    pub fn toggle(&mut self) -> VoiceToggle {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return VoiceToggle::Unavailable;
        };

        if self.session.is_some() {
            recognizer.stop();
            tracing::info!("voice capture stop requested");
            return VoiceToggle::Stopping;
        }

        match recognizer.start() {
            Ok(()) => {
                self.session = Some(RecognitionSession::default());
                tracing::info!("voice capture listening");
                VoiceToggle::Started
            }
            Err(kind) => {
                tracing::warn!(kind = %kind, "voice capture failed to start");
                VoiceToggle::Failed(kind)
            }
        }
    }

    pub fn handle(&mut self, event: RecognitionEvent) -> VoiceUpdate {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(?event, "recognition event without a session");
            return VoiceUpdate::Ignored;
        };

        match event {
            RecognitionEvent::Results(results) => {
                let mut interim = String::new();
                for result in results {
                    if result.is_final {
                        session.final_transcript.push_str(&result.transcript);
                    } else {
                        interim.push_str(&result.transcript);
                    }
                }
                VoiceUpdate::Display(format!("{}{}", session.final_transcript, interim))
            }
            RecognitionEvent::Error(kind) => {
                self.session = None;
                tracing::warn!(kind = %kind, "voice capture failed");
                VoiceUpdate::Failed(kind)
            }
            RecognitionEvent::End => {
                let transcript = self
                    .session
                    .take()
                    .map(|session| session.final_transcript.trim().to_string())
                    .filter(|transcript| !transcript.is_empty());
                tracing::info!(recognized = transcript.is_some(), "voice capture ended");
                VoiceUpdate::Finished(transcript)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct Calls {
        starts: usize,
        stops: usize,
    }

    struct Scripted {
        calls: Arc<Mutex<Calls>>,
        refuse: Option<RecognitionErrorKind>,
    }

    impl SpeechRecognizer for Scripted {
        fn start(&mut self) -> Result<(), RecognitionErrorKind> {
            self.calls.lock().expect("calls").starts += 1;
            match self.refuse.clone() {
                Some(kind) => Err(kind),
                None => Ok(()),
            }
        }

        fn stop(&mut self) {
            self.calls.lock().expect("calls").stops += 1;
        }
    }

    fn capture(refuse: Option<RecognitionErrorKind>) -> (VoiceCapture, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let recognizer = Scripted {
            calls: Arc::clone(&calls),
            refuse,
        };
        (VoiceCapture::new(Some(Box::new(recognizer))), calls)
    }

    #[test]
    fn interim_text_is_displayed_but_not_kept() {
        let (mut voice, _) = capture(None);
        assert_eq!(voice.toggle(), VoiceToggle::Started);

        let update = voice.handle(RecognitionEvent::Results(vec![
            RecognitionResult::final_text("hello "),
            RecognitionResult::interim("wor"),
        ]));
        assert_eq!(update, VoiceUpdate::Display("hello wor".to_string()));

        let update = voice.handle(RecognitionEvent::Results(vec![RecognitionResult::interim(
            "there",
        )]));
        assert_eq!(update, VoiceUpdate::Display("hello there".to_string()));

        assert_eq!(
            voice.handle(RecognitionEvent::End),
            VoiceUpdate::Finished(Some("hello".to_string()))
        );
        assert!(!voice.is_listening());
    }

    #[test]
    fn toggling_while_listening_stops_the_same_stream() {
        let (mut voice, calls) = capture(None);
        voice.toggle();
        assert_eq!(voice.toggle(), VoiceToggle::Stopping);
        assert!(voice.is_listening());

        let calls = calls.lock().expect("calls");
        assert_eq!((calls.starts, calls.stops), (1, 1));
    }

    #[test]
    fn no_speech_returns_to_idle_with_its_message() {
        let (mut voice, _) = capture(None);
        voice.toggle();

        let update = voice.handle(RecognitionEvent::Error(RecognitionErrorKind::NoSpeech));
        assert_eq!(update, VoiceUpdate::Failed(RecognitionErrorKind::NoSpeech));
        assert!(!voice.is_listening());
        assert_eq!(
            RecognitionErrorKind::NoSpeech.user_message(),
            NO_SPEECH_MESSAGE
        );
        // The trailing end event of a failed session is ignored.
        assert_eq!(voice.handle(RecognitionEvent::End), VoiceUpdate::Ignored);
    }

    #[test]
    fn error_messages_distinguish_permission_from_generic() {
        assert_eq!(
            RecognitionErrorKind::NotAllowed.user_message(),
            PERMISSION_DENIED_MESSAGE
        );
        assert_eq!(
            RecognitionErrorKind::AudioCapture.user_message(),
            "Speech recognition error: audio-capture"
        );
    }

    #[test]
    fn missing_recognizer_fails_closed() {
        let mut voice = VoiceCapture::unavailable();
        assert!(!voice.is_available());
        assert_eq!(voice.toggle(), VoiceToggle::Unavailable);
        assert!(!voice.is_listening());
    }

    #[test]
    fn refused_start_leaves_capture_idle() {
        let (mut voice, _) = capture(Some(RecognitionErrorKind::NotAllowed));
        assert_eq!(
            voice.toggle(),
            VoiceToggle::Failed(RecognitionErrorKind::NotAllowed)
        );
        assert!(!voice.is_listening());
    }
}
