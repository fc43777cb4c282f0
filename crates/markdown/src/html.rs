use crate::escape::{escape_attribute, is_safe_href};
use crate::tree::{Block, Document, Inline};

/// Target written in place of a link whose scheme is not allowed.
const BLOCKED_HREF: &str = "#";

/// Serializes a parsed document. Blocks are separated by a newline.
pub fn to_html(document: &Document) -> String {
    let mut out = String::new();
    for (index, block) in document.blocks.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Code {
            language: Some(language),
            code,
        } => {
            out.push_str("<pre><code class=\"language-");
            out.push_str(language);
            out.push_str("\">");
            out.push_str(code);
            out.push_str("</code></pre>");
        }
        Block::Code {
            language: None,
            code,
        } => {
            out.push_str("<pre><code>");
            out.push_str(code);
            out.push_str("</code></pre>");
        }
        Block::Heading { level, content } => {
            out.push_str(&format!("<h{level}>"));
            write_inlines(out, content);
            out.push_str(&format!("</h{level}>"));
        }
        Block::BulletList(items) => write_list(out, "ul", items),
        Block::OrderedList(items) => write_list(out, "ol", items),
        Block::Quote(content) => {
            out.push_str("<blockquote>");
            write_inlines(out, content);
            out.push_str("</blockquote>");
        }
        Block::Rule => out.push_str("<hr>"),
        Block::Paragraph(lines) => {
            out.push_str("<p>");
            for (index, line) in lines.iter().enumerate() {
                if index > 0 {
                    out.push_str("<br>");
                }
                write_inlines(out, line);
            }
            out.push_str("</p>");
        }
    }
}

fn write_list(out: &mut String, tag: &str, items: &[Vec<Inline>]) {
    out.push_str(&format!("<{tag}>"));
    for item in items {
        out.push_str("<li>");
        write_inlines(out, item);
        out.push_str("</li>");
    }
    out.push_str(&format!("</{tag}>"));
}

fn write_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(code);
                out.push_str("</code>");
            }
            Inline::Strong(children) => {
                out.push_str("<strong>");
                write_inlines(out, children);
                out.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                write_inlines(out, children);
                out.push_str("</em>");
            }
            Inline::Link { label, href } => {
                let href = if is_safe_href(href) {
                    escape_attribute(href)
                } else {
                    BLOCKED_HREF.to_string()
                };
                out.push_str("<a href=\"");
                out.push_str(&href);
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                write_inlines(out, label);
                out.push_str("</a>");
            }
        }
    }
}
