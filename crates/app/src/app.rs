use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use maddy_chat::export::{to_html_document, write_document};
use maddy_chat::{
    ChatController, DecodedJob, ImageDecoder, ImageJob, MessageId, PendingSend, RasterDecoder,
    SendTicket, decode_job,
};
use maddy_client::{
    BoxFuture, ChatResponse, ChatTransport, ClientError, ClientResult, HttpChatTransport,
    StagedFile, send_with_timeout,
};
use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::settings::{ChatSettings, SettingsError};
use crate::terminal::{
    Command, TranscriptPrinter, format_chips, format_preview, help_text, parse_command,
};

pub const EXPORT_TITLE: &str = "MaddyBot conversation";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AppError {
    #[snafu(display("failed to start the async runtime on `{stage}`: {source}"))]
    Runtime {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to create the chat transport on `{stage}`: {source}"))]
    BuildTransport {
        stage: &'static str,
        source: ClientError,
    },
    #[snafu(display("failed to save settings on `{stage}`: {source}"))]
    SaveSettings {
        stage: &'static str,
        source: SettingsError,
    },
    #[snafu(display("failed to read terminal input on `{stage}`: {source}"))]
    ReadInput {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to write terminal output on `{stage}`: {source}"))]
    WriteOutput {
        stage: &'static str,
        source: std::io::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

type SendFuture = BoxFuture<'static, (SendTicket, ClientResult<ChatResponse>)>;

/// Terminal chat session around one [`ChatController`].
pub struct ChatApp {
    controller: ChatController,
    transport: Arc<dyn ChatTransport>,
    decoder: Arc<dyn ImageDecoder>,
    timeout: Duration,
    transcript_path: Option<PathBuf>,
    printer: TranscriptPrinter,
    status_shown: Option<&'static str>,
    in_flight: Option<SendFuture>,
    decodes: FuturesUnordered<BoxFuture<'static, DecodedJob>>,
}

impl ChatApp {
    /// Builds a session talking HTTP to the configured endpoint.
    pub fn connect(settings: &ChatSettings) -> AppResult<Self> {
        let transport = HttpChatTransport::new(&settings.transport_config()).context(
            BuildTransportSnafu {
                stage: "build-http-transport",
            },
        )?;
        tracing::info!(url = %transport.chat_url(), "chat transport ready");
        Ok(Self::new(settings, Arc::new(transport)))
    }

    pub fn new(settings: &ChatSettings, transport: Arc<dyn ChatTransport>) -> Self {
        let decoder: Arc<dyn ImageDecoder> = Arc::new(RasterDecoder);
        Self {
            controller: ChatController::new(
                settings.controller_config(),
                Arc::clone(&decoder),
                None,
            ),
            transport,
            decoder,
            timeout: settings.request_timeout(),
            transcript_path: settings.transcript_path.clone(),
            printer: TranscriptPrinter::new(),
            status_shown: None,
            in_flight: None,
            decodes: FuturesUnordered::new(),
        }
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    /// Runs until `/quit`, or until input ends and all pending work drained.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut input_open = true;
        self.refresh(out).await?;

        loop {
            if !input_open && self.in_flight.is_none() && self.decodes.is_empty() {
                break;
            }

            // Finished work is applied before the next line is read.
            tokio::select! {
                biased;

                Some((ticket, result)) = next_reply(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    if let Ok(completion) = self.controller.finish_send(ticket, result) {
                        self.queue_decodes(completion.jobs);
                    }
                }
                Some(decoded) = self.decodes.next(), if !self.decodes.is_empty() => {
                    let message_id = decoded.message_id;
                    let name = decoded.name.clone();
                    if self.controller.attach_image(decoded) {
                        self.print_attached(message_id, &name, out)?;
                    }
                }
                line = lines.next_line(), if input_open => {
                    match line.context(ReadInputSnafu { stage: "read-input-line" })? {
                        Some(line) => {
                            if !self.handle_line(&line, out).await? {
                                break;
                            }
                        }
                        None => input_open = false,
                    }
                }
            }

            self.refresh(out).await?;
        }

        Ok(())
    }

    /// Applies one line of input. Returns `false` when the session should end.
    async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> AppResult<bool> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(error) => {
                emit(out, &error.to_string())?;
                return Ok(true);
            }
        };

        match command {
            // The input is locked while busy, so typed text never reaches the form.
            Command::Send(_) if self.controller.is_sending() => {
                emit(out, "Still waiting for the previous reply.")?;
            }
            Command::Send(text) => {
                self.controller.set_input(text);
                match self.controller.submit_form() {
                    Ok(pending) => self.start_send(pending),
                    Err(rejection) => tracing::debug!(?rejection, "send not started"),
                }
            }
            Command::Files(paths) => {
                let selection = load_files(paths, out).await?;
                self.controller.set_files(selection);
                self.print_staged(out)?;
            }
            Command::Images(paths) => {
                let selection = load_files(paths, out).await?;
                self.controller.set_images(selection);
                self.print_staged(out)?;
            }
            Command::RemoveFile(index) => {
                if self.controller.remove_file_at(index).is_none() {
                    emit(out, &format!("No document {} is staged.", index + 1))?;
                }
                self.print_staged(out)?;
            }
            Command::RemoveImage(index) => {
                if self.controller.remove_image_at(index).is_none() {
                    emit(out, &format!("No image {} is staged.", index + 1))?;
                }
                self.print_staged(out)?;
            }
            Command::Staged => self.print_staged(out)?,
            Command::Voice => {
                self.controller.toggle_voice();
            }
            Command::Help => emit(out, &help_text(self.controller.voice().is_available()))?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn start_send(&mut self, pending: PendingSend) {
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;
        self.in_flight = Some(Box::pin(async move {
            let result = send_with_timeout(transport.as_ref(), pending.request, timeout).await;
            (pending.ticket, result)
        }));
    }

    fn queue_decodes(&mut self, jobs: Vec<ImageJob>) {
        for job in jobs {
            self.decodes.push(decode_job(Arc::clone(&self.decoder), job));
        }
    }

    /// Prints new messages, notices and the busy status, then refreshes the export.
    async fn refresh<W: Write>(&mut self, out: &mut W) -> AppResult<()> {
        for line in self.printer.pending_lines(self.controller.transcript()) {
            emit(out, &line)?;
        }
        if let Some(notice) = self.controller.take_notice() {
            emit(out, &notice)?;
        }
        let status = self.controller.input().status();
        if status != self.status_shown {
            if let Some(status) = status {
                emit(out, status)?;
            }
            self.status_shown = status;
        }
        self.export().await;
        Ok(())
    }

    async fn export(&self) {
        let Some(path) = &self.transcript_path else {
            return;
        };
        let html = to_html_document(self.controller.transcript(), EXPORT_TITLE);
        if let Err(error) = write_document(path, &html).await {
            tracing::warn!(stage = error.stage(), error = %error, "transcript export failed");
        }
    }

    fn print_staged<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let chips = self.controller.staging().preview();
        emit(out, &format_chips(chips.as_deref()))
    }

    fn print_attached<W: Write>(
        &self,
        message_id: MessageId,
        name: &str,
        out: &mut W,
    ) -> AppResult<()> {
        let preview = self
            .controller
            .transcript()
            .message(message_id)
            .and_then(|rendered| rendered.images.iter().rev().find(|image| image.name() == name));
        match preview {
            Some(preview) => emit(out, &format_preview(preview)),
            None => Ok(()),
        }
    }
}

async fn next_reply(
    in_flight: &mut Option<SendFuture>,
) -> Option<(SendTicket, ClientResult<ChatResponse>)> {
    match in_flight {
        Some(send) => Some(send.await),
        None => None,
    }
}

/// Reads every path, reporting the ones that cannot be read.
async fn load_files<W: Write>(paths: Vec<PathBuf>, out: &mut W) -> AppResult<Vec<StagedFile>> {
    let mut selection = Vec::with_capacity(paths.len());
    for path in paths {
        match StagedFile::from_path(&path).await {
            Ok(file) => selection.push(file),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "skipping unreadable file");
                emit(out, &format!("Cannot read {}.", path.display()))?;
            }
        }
    }
    Ok(selection)
}

fn emit<W: Write>(out: &mut W, line: &str) -> AppResult<()> {
    writeln!(out, "{line}").context(WriteOutputSnafu {
        stage: "write-output-line",
    })
}
