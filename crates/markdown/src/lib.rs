#![deny(unsafe_code)]

//! Markdown rendering for chat message bodies.
//!
//! Raw text is escaped once, parsed into a small [`Document`] tree and then
//! serialized to HTML. Parsing honors this precedence:
//!
//! 1. fenced code blocks (bodies are never parsed further)
//! 2. inline code spans
//! 3. headings (`###` before `##` before `#`)
//! 4. bold, then italic, with link targets kept literal
//! 5. bullet lists, then numbered lists, as separate containers
//! 6. quotes (one block per line) and horizontal rules
//! 7. paragraphs split on blank lines, with line breaks inside
//!
//! Rendering is single-pass: feeding the output back in escapes it again.

mod block;
pub mod escape;
mod html;
mod inline;
pub mod tree;

pub use escape::{escape_attribute, escape_text};
pub use tree::{Block, Document, Inline};

/// Parses raw message text into an escaped node tree.
pub fn parse(text: &str) -> Document {
    let escaped = escape_text(text);
    Document::new(block::parse_blocks(&escaped))
}

/// Renders raw message text to sanitized HTML. Empty input renders to an
/// empty string.
pub fn render(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    html::to_html(&parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_render_nothing() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n  \n"), "");
    }

    #[test]
    fn script_tags_are_never_emitted() {
        let html = render("<script>alert('x')</script>\n**<script>**\n`<script>`");
        assert!(!html.contains("<script>"));
        assert_eq!(html.matches("&lt;script&gt;").count(), 3);
    }

    #[test]
    fn code_fences_do_not_reopen_escaped_markup() {
        let html = render("```html\n<b>hi</b>\n```");
        assert_eq!(
            html,
            "<pre><code class=\"language-html\">&lt;b&gt;hi&lt;/b&gt;</code></pre>"
        );
    }

    #[test]
    fn escaping_happens_exactly_once_per_render() {
        let once = render("a < b & c");
        assert_eq!(once, "<p>a &lt; b &amp; c</p>");

        // Not idempotent across renders: the first pass output is escaped again.
        let twice = render(&once);
        assert_eq!(twice, "<p>&lt;p&gt;a &amp;lt; b &amp;amp; c&lt;/p&gt;</p>");
    }

    #[test]
    fn bold_and_italic_each_appear_once() {
        let html = render("**bold** and *italic*");
        assert_eq!(html.matches("<strong>bold</strong>").count(), 1);
        assert_eq!(html.matches("<em>italic</em>").count(), 1);
        assert_eq!(html, "<p><strong>bold</strong> and <em>italic</em></p>");
    }

    #[test]
    fn three_bullets_share_one_container() {
        let html = render("- one\n- two\n- three");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 3);
        assert_eq!(html, "<ul><li>one</li><li>two</li><li>three</li></ul>");
    }

    #[test]
    fn numbered_run_after_bullets_gets_its_own_container() {
        assert_eq!(
            render("- a\n1. b\n2. c"),
            "<ul><li>a</li></ul>\n<ol><li>b</li><li>c</li></ol>"
        );
    }

    #[test]
    fn links_open_in_new_context_without_opener() {
        assert_eq!(
            render("see [docs](https://example.com/a_b)"),
            "<p>see <a href=\"https://example.com/a_b\" target=\"_blank\" \
             rel=\"noopener noreferrer\">docs</a></p>"
        );
    }

    #[test]
    fn link_targets_cannot_break_out_of_the_attribute() {
        let html = render("[x](https://a.b/\"onmouseover=\"alert(1))");
        assert!(html.contains("href=\"https://a.b/&quot;onmouseover=&quot;alert(1\""));
        assert!(!html.contains("\" onmouseover"));
    }

    #[test]
    fn script_scheme_links_are_neutralized() {
        assert_eq!(
            render("[x](javascript:void)"),
            "<p><a href=\"#\" target=\"_blank\" rel=\"noopener noreferrer\">x</a></p>"
        );
    }

    #[test]
    fn unterminated_fence_renders_as_text() {
        assert_eq!(render("```rust\nfn main()"), "<p>```rust<br>fn main()</p>");
    }

    #[test]
    fn inline_triple_backticks_keep_their_words() {
        let html = render("Run ```npm install``` first");
        assert!(html.contains("npm install"));
        assert!(!html.contains("<pre>"));
        assert!(!html.contains("language-npm"));

        let html = render("``` x ```py\ncode\n```");
        let (paragraph, code) = html.split_once('\n').expect("two blocks");
        assert!(paragraph.starts_with("<p>") && paragraph.contains('x'));
        assert_eq!(code, "<pre><code class=\"language-py\">code</code></pre>");
    }

    #[test]
    fn full_message_layout() {
        let text = "# Title\n\nIntro line\nsecond line\n\n> quoted\n---\n```py\nx = 1\n```\n1. first\n2. second";
        assert_eq!(
            render(text),
            "<h1>Title</h1>\n\
             <p>Intro line<br>second line</p>\n\
             <blockquote>quoted</blockquote>\n\
             <hr>\n\
             <pre><code class=\"language-py\">x = 1</code></pre>\n\
             <ol><li>first</li><li>second</li></ol>"
        );
    }
}
