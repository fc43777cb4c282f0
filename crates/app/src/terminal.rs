use std::path::PathBuf;

use maddy_chat::transcript::EMPTY_PLACEHOLDER;
use maddy_chat::{Chip, ChipKind, ImagePreview, RenderedMessage, TranscriptView};
use snafu::Snafu;

pub const HELP: &str = "\
Type a message and press Enter to send it with anything staged.
  /files <path>...    stage documents (replaces the current selection)
  /images <path>...   stage images (replaces the current selection)
  /rm-file <n>        unstage document n
  /rm-image <n>       unstage image n
  /staged             list staged attachments
  /voice              start or stop voice capture
  /help               show this help
  /quit               exit";

/// Help text, leaving out `/voice` when no recognizer is available.
pub fn help_text(voice_available: bool) -> String {
    HELP.lines()
        .filter(|line| voice_available || !line.trim_start().starts_with("/voice"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text. May be empty when only attachments are sent.
    Send(String),
    Files(Vec<PathBuf>),
    Images(Vec<PathBuf>),
    /// Zero-based index of the document to unstage.
    RemoveFile(usize),
    RemoveImage(usize),
    Staged,
    Voice,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CommandError {
    #[snafu(display("unknown command `/{name}`, try /help"))]
    UnknownCommand { name: String },
    #[snafu(display("`/{name}` needs {expected}"))]
    MissingArgument { name: String, expected: &'static str },
    #[snafu(display("`{value}` is not a chip number"))]
    InvalidIndex { value: String },
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match name {
        "files" => paths(name, &args).map(Command::Files),
        "images" => paths(name, &args).map(Command::Images),
        "rm-file" => index(name, &args).map(Command::RemoveFile),
        "rm-image" => index(name, &args).map(Command::RemoveImage),
        "staged" => Ok(Command::Staged),
        "voice" => Ok(Command::Voice),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => UnknownCommandSnafu { name }.fail(),
    }
}

fn paths(name: &str, args: &[&str]) -> Result<Vec<PathBuf>, CommandError> {
    if args.is_empty() {
        return MissingArgumentSnafu {
            name,
            expected: "at least one path",
        }
        .fail();
    }
    Ok(args.iter().map(PathBuf::from).collect())
}

/// Chip numbers are shown one-based.
fn index(name: &str, args: &[&str]) -> Result<usize, CommandError> {
    let Some(value) = args.first() else {
        return MissingArgumentSnafu {
            name,
            expected: "a chip number",
        }
        .fail();
    };
    match value.parse::<usize>() {
        Ok(number) if number > 0 => Ok(number - 1),
        _ => InvalidIndexSnafu { value: *value }.fail(),
    }
}

/// Prints transcript messages that have not been printed yet.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    printed: usize,
    placeholder_shown: bool,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_lines(&mut self, transcript: &TranscriptView) -> Vec<String> {
        let mut lines = Vec::new();
        if transcript.is_placeholder_visible() {
            if !self.placeholder_shown {
                self.placeholder_shown = true;
                lines.push(EMPTY_PLACEHOLDER.to_string());
            }
            return lines;
        }

        for rendered in transcript.messages().skip(self.printed) {
            lines.extend(format_message(rendered));
            self.printed += 1;
        }
        lines
    }
}

pub fn format_message(rendered: &RenderedMessage) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {}",
        rendered.message.author, rendered.message.text
    )];
    lines.extend(rendered.images.iter().map(format_preview));
    lines.extend(rendered.files.iter().map(|name| format!("  [file] {name}")));
    if let Some(audio) = &rendered.audio {
        lines.push(format!("  [audio] {}", audio.name));
    }
    lines
}

pub fn format_preview(preview: &ImagePreview) -> String {
    match preview {
        ImagePreview::Ready { name, image } => {
            format!("  [image] {name} ({}x{})", image.width, image.height)
        }
        ImagePreview::Broken { name } => format!("  [image unavailable] {name}"),
    }
}

pub fn format_chips(chips: Option<&[Chip]>) -> String {
    let Some(chips) = chips else {
        return "Nothing staged.".to_string();
    };
    chips
        .iter()
        .map(|chip| {
            let kind = match chip.kind {
                ChipKind::File => "file",
                ChipKind::Image => "image",
            };
            format!("[{kind} {}] {}", chip.index + 1, chip.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use maddy_chat::{Attachments, FileRef, ImageRef, RasterDecoder};

    use super::*;

    #[test]
    fn plain_text_is_sent_trimmed() {
        assert_eq!(
            parse_command("  hello there \n"),
            Ok(Command::Send("hello there".to_string()))
        );
        assert_eq!(parse_command(""), Ok(Command::Send(String::new())));
    }

    #[test]
    fn staging_commands_take_paths() {
        assert_eq!(
            parse_command("/images a.png b.jpg"),
            Ok(Command::Images(vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.jpg")
            ]))
        );
        assert_eq!(
            parse_command("/files"),
            Err(CommandError::MissingArgument {
                name: "files".to_string(),
                expected: "at least one path",
            })
        );
    }

    #[test]
    fn chip_numbers_are_one_based() {
        assert_eq!(parse_command("/rm-file 1"), Ok(Command::RemoveFile(0)));
        assert_eq!(parse_command("/rm-image 3"), Ok(Command::RemoveImage(2)));
        assert_eq!(
            parse_command("/rm-image 0"),
            Err(CommandError::InvalidIndex {
                value: "0".to_string()
            })
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse_command("/dance"),
            Err(CommandError::UnknownCommand {
                name: "dance".to_string()
            })
        );
        assert_eq!(parse_command("/exit"), Ok(Command::Quit));
    }

    #[test]
    fn printer_emits_each_message_once() {
        let mut transcript = TranscriptView::new(Arc::new(RasterDecoder));
        let mut printer = TranscriptPrinter::new();

        assert_eq!(printer.pending_lines(&transcript), [EMPTY_PLACEHOLDER]);
        assert!(printer.pending_lines(&transcript).is_empty());

        transcript.append_message("You", "hi", true, None);
        transcript.append_message(
            "MaddyBot",
            "here",
            false,
            Some(Attachments {
                images: vec![ImageRef::base64("plot.png", "not base64")],
                files: vec![FileRef::new("report.pdf")],
                audio: None,
            }),
        );

        assert_eq!(
            printer.pending_lines(&transcript),
            [
                "You: hi",
                "MaddyBot: here",
                "  [image unavailable] plot.png",
                "  [file] report.pdf",
            ]
        );
        assert!(printer.pending_lines(&transcript).is_empty());
    }

    #[test]
    fn voice_help_is_hidden_without_a_recognizer() {
        assert!(help_text(true).contains("/voice"));
        assert!(!help_text(false).contains("/voice"));
        assert!(help_text(false).contains("/quit"));
    }

    #[test]
    fn chips_are_listed_with_numbers() {
        assert_eq!(format_chips(None), "Nothing staged.");
        let chips = [
            Chip {
                kind: ChipKind::File,
                index: 0,
                label: "notes.txt".to_string(),
            },
            Chip {
                kind: ChipKind::Image,
                index: 0,
                label: "cat.png".to_string(),
            },
        ];
        assert_eq!(
            format_chips(Some(&chips)),
            "[file 1] notes.txt  [image 1] cat.png"
        );
    }
}
