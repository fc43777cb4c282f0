use std::path::Path;

use maddy_markdown::{escape_attribute, escape_text};
use snafu::ResultExt;

use crate::error::{ChatResult, WriteTranscriptSnafu};
use crate::images::ImagePreview;
use crate::transcript::{
    EMPTY_PLACEHOLDER, RenderedMessage, TYPING_MARKER, TranscriptItem, TranscriptView,
};

const STYLE: &str = "\
body{ font: 14px/1.5 -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; margin:0; background:#f6f7f9; color:#1f2328; }
.container{ max-width: 860px; margin:24px auto; padding:0 16px; }
.placeholder{ text-align:center; opacity:0.6; margin:48px 0; }
.row{ display:flex; margin:10px 0; }
.row.user{ justify-content:flex-end; }
.row.bot{ justify-content:flex-start; }
.bubble{ border-radius:14px; padding:10px 12px; max-width:680px; overflow-wrap:anywhere; background:#ffffff; border:1px solid rgba(127,127,127,0.2); }
.user .bubble{ background:#dbeafe; }
.author{ font-weight:600; margin-bottom:6px; opacity:0.8; }
.attachments img{ max-width:240px; border-radius:8px; margin:4px 4px 4px 0; }
.chip{ display:inline-block; padding:2px 8px; border-radius:10px; background:rgba(127,127,127,0.15); margin:2px 4px 2px 0; }
.broken{ display:inline-block; padding:8px; border:1px dashed rgba(127,127,127,0.6); border-radius:8px; }
.typing .marker{ letter-spacing:2px; }
.bubble pre{ background: rgba(127,127,127,0.15); border-radius:8px; padding:10px; overflow:auto; }
.bubble code{ font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 0.95em; }
";

/// Serializes the transcript into a standalone HTML document.
pub fn to_html_document(transcript: &TranscriptView, title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n<style>\n", escape_text(title)));
    out.push_str(STYLE);
    out.push_str("</style></head><body><div class=\"container\">\n");

    if transcript.is_placeholder_visible() {
        out.push_str(&format!(
            "<div class=\"placeholder\">{}</div>\n",
            escape_text(EMPTY_PLACEHOLDER)
        ));
    }

    for item in transcript.items() {
        match item {
            TranscriptItem::Message(rendered) => push_message(&mut out, rendered),
            TranscriptItem::Typing { author } => {
                out.push_str("<div class=\"row bot typing\"><div class=\"bubble\">");
                out.push_str(&format!(
                    "<div class=\"author\">{}</div><span class=\"marker\">{}</span>",
                    escape_text(author),
                    TYPING_MARKER
                ));
                out.push_str("</div></div>\n");
            }
        }
    }

    out.push_str("</div></body></html>\n");
    out
}

fn push_message(out: &mut String, rendered: &RenderedMessage) {
    let side = if rendered.message.is_user { "user" } else { "bot" };
    out.push_str(&format!(
        "<div class=\"row {side}\" id=\"message-{}\"><div class=\"bubble\">",
        rendered.message.id.0
    ));
    out.push_str(&format!(
        "<div class=\"author\">{}</div>",
        escape_text(&rendered.message.author)
    ));

    let has_attachments =
        !rendered.images.is_empty() || !rendered.files.is_empty() || rendered.audio.is_some();
    if has_attachments {
        out.push_str("<div class=\"attachments\">");
        for image in &rendered.images {
            match image {
                ImagePreview::Ready { name, image } => out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\">",
                    image.data_uri(),
                    escape_attribute(&escape_text(name)),
                    image.width,
                    image.height
                )),
                ImagePreview::Broken { name } => out.push_str(&format!(
                    "<span class=\"broken\">{}</span>",
                    escape_text(name)
                )),
            }
        }
        for file in &rendered.files {
            out.push_str(&format!("<span class=\"chip\">{}</span>", escape_text(file)));
        }
        if let Some(audio) = &rendered.audio {
            out.push_str(&format!(
                "<span class=\"chip audio\">{}</span>",
                escape_text(&audio.name)
            ));
        }
        out.push_str("</div>");
    }

    out.push_str(&format!("<div class=\"content\">{}</div>", rendered.html));
    out.push_str("</div></div>\n");
}

/// Writes the exported document, replacing any previous export.
pub async fn write_document(path: &Path, html: &str) -> ChatResult<()> {
    tokio::fs::write(path, html).await.context(WriteTranscriptSnafu {
        stage: "write-transcript-export",
        path: path.to_path_buf(),
    })
}
