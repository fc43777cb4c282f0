use crate::inline::parse_inline;
use crate::tree::{Block, Inline};

const FENCE: &str = "```";

/// Raw input split around fenced code blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Code {
        language: Option<&'a str>,
        body: &'a str,
    },
}

/// Classification of one line outside a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Rule,
    Heading(u8, &'a str),
    Bullet(&'a str),
    Numbered(&'a str),
    Quote(&'a str),
    Text(&'a str),
}

/// Parses escaped text into block nodes.
pub fn parse_blocks(escaped: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for segment in split_fences(escaped) {
        match segment {
            Segment::Code { language, body } => blocks.push(Block::Code {
                language: language.map(str::to_string),
                code: body.trim().to_string(),
            }),
            Segment::Text(text) => parse_text_segment(text, &mut blocks),
        }
    }
    blocks
}

/// Splits out every ```` ```lang\nbody``` ```` pair, closing each fence at the
/// nearest following marker. A marker not followed by an optional language and
/// a newline stays literal text, as does an opener without a closer.
fn split_fences(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(found) = input[cursor..].find(FENCE) {
        let open = cursor + found;
        let after_open = &input[open + FENCE.len()..];
        let language_len = after_open
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
            .unwrap_or(after_open.len());
        let (language, after_language) = after_open.split_at(language_len);

        let Some(body_start) = after_language.strip_prefix('\n') else {
            cursor = open + FENCE.len();
            continue;
        };
        let Some(close) = body_start.find(FENCE) else {
            break;
        };

        if open > text_start {
            segments.push(Segment::Text(&input[text_start..open]));
        }
        segments.push(Segment::Code {
            language: (!language.is_empty()).then_some(language),
            body: &body_start[..close],
        });

        let body_offset = input.len() - body_start.len();
        text_start = body_offset + close + FENCE.len();
        cursor = text_start;
    }

    if text_start < input.len() {
        segments.push(Segment::Text(&input[text_start..]));
    }
    segments
}

fn parse_text_segment(text: &str, blocks: &mut Vec<Block>) {
    let mut paragraph: Vec<Vec<Inline>> = Vec::new();
    let mut bullets: Vec<Vec<Inline>> = Vec::new();
    let mut numbered: Vec<Vec<Inline>> = Vec::new();

    for line in text.split('\n').map(classify) {
        if !matches!(line, Line::Text(_)) {
            flush_paragraph(&mut paragraph, blocks);
        }
        if !matches!(line, Line::Bullet(_)) {
            flush_list(&mut bullets, blocks, Block::BulletList);
        }
        if !matches!(line, Line::Numbered(_)) {
            flush_list(&mut numbered, blocks, Block::OrderedList);
        }

        match line {
            Line::Blank => {}
            Line::Rule => blocks.push(Block::Rule),
            Line::Heading(level, content) => blocks.push(Block::Heading {
                level,
                content: parse_inline(content),
            }),
            Line::Bullet(item) => bullets.push(parse_inline(item)),
            Line::Numbered(item) => numbered.push(parse_inline(item)),
            Line::Quote(content) => blocks.push(Block::Quote(parse_inline(content))),
            Line::Text(content) => paragraph.push(parse_inline(content)),
        }
    }

    flush_paragraph(&mut paragraph, blocks);
    flush_list(&mut bullets, blocks, Block::BulletList);
    flush_list(&mut numbered, blocks, Block::OrderedList);
}

fn flush_paragraph(lines: &mut Vec<Vec<Inline>>, blocks: &mut Vec<Block>) {
    if !lines.is_empty() {
        blocks.push(Block::Paragraph(std::mem::take(lines)));
    }
}

fn flush_list(
    items: &mut Vec<Vec<Inline>>,
    blocks: &mut Vec<Block>,
    wrap: fn(Vec<Vec<Inline>>) -> Block,
) {
    if !items.is_empty() {
        blocks.push(wrap(std::mem::take(items)));
    }
}

fn classify(line: &str) -> Line<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line == "---" || line == "***" {
        return Line::Rule;
    }

    // Most specific heading marker first so "### x" never reads as "# ## x".
    for (marker, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(content) = line.strip_prefix(marker) {
            return Line::Heading(level, content);
        }
    }

    for marker in ["* ", "- ", "+ "] {
        if let Some(item) = line.strip_prefix(marker)
            && !item.is_empty()
        {
            return Line::Bullet(item);
        }
    }

    if let Some(item) = numbered_item(line) {
        return Line::Numbered(item);
    }

    if let Some(content) = line.strip_prefix("&gt; ")
        && !content.is_empty()
    {
        return Line::Quote(content);
    }

    Line::Text(line)
}

fn numbered_item(line: &str) -> Option<&str> {
    let digits = line.find(|ch: char| !ch.is_ascii_digit())?;
    if digits == 0 {
        return None;
    }
    let item = line[digits..].strip_prefix(". ")?;
    (!item.is_empty()).then_some(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Vec<Inline> {
        vec![Inline::text(value)]
    }

    #[test]
    fn fences_close_at_nearest_marker() {
        assert_eq!(
            split_fences("a ```rust\nfn x() {}\n``` b ```\ny``` c"),
            vec![
                Segment::Text("a "),
                Segment::Code {
                    language: Some("rust"),
                    body: "fn x() {}\n",
                },
                Segment::Text(" b "),
                Segment::Code {
                    language: None,
                    body: "y",
                },
                Segment::Text(" c"),
            ]
        );
    }

    #[test]
    fn unterminated_fence_is_text() {
        assert_eq!(
            split_fences("```py\nprint(1)\nmore"),
            vec![Segment::Text("```py\nprint(1)\nmore")]
        );
        assert_eq!(
            split_fences("```a``` then ```b"),
            vec![Segment::Text("```a``` then ```b")]
        );
    }

    #[test]
    fn opener_needs_a_newline_after_the_language() {
        assert_eq!(
            split_fences("Run ```npm install``` first"),
            vec![Segment::Text("Run ```npm install``` first")]
        );
        assert_eq!(
            split_fences("``` x ```py\ncode\n```"),
            vec![
                Segment::Text("``` x "),
                Segment::Code {
                    language: Some("py"),
                    body: "code\n",
                },
            ]
        );
    }

    #[test]
    fn code_block_body_is_trimmed() {
        assert_eq!(
            parse_blocks("```\n\n  let x = 1;  \n\n```"),
            vec![Block::Code {
                language: None,
                code: "let x = 1;".to_string(),
            }]
        );
    }

    #[test]
    fn heading_levels_prefer_longest_marker() {
        assert_eq!(
            parse_blocks("### three\n## two\n# one\n#none"),
            vec![
                Block::Heading {
                    level: 3,
                    content: text("three"),
                },
                Block::Heading {
                    level: 2,
                    content: text("two"),
                },
                Block::Heading {
                    level: 1,
                    content: text("one"),
                },
                Block::Paragraph(vec![text("#none")]),
            ]
        );
    }

    #[test]
    fn mixed_list_markers_split_into_separate_containers() {
        assert_eq!(
            parse_blocks("- a\n+ b\n1. c\n2. d\n* e"),
            vec![
                Block::BulletList(vec![text("a"), text("b")]),
                Block::OrderedList(vec![text("c"), text("d")]),
                Block::BulletList(vec![text("e")]),
            ]
        );
    }

    #[test]
    fn quotes_stay_line_by_line() {
        assert_eq!(
            parse_blocks("&gt; one\n&gt; two"),
            vec![Block::Quote(text("one")), Block::Quote(text("two"))]
        );
    }

    #[test]
    fn rules_win_over_emphasis_and_bullets() {
        assert_eq!(
            parse_blocks("***\n---\n- -"),
            vec![
                Block::Rule,
                Block::Rule,
                Block::BulletList(vec![text("-")]),
            ]
        );
    }

    #[test]
    fn blank_lines_split_paragraphs_and_single_newlines_do_not() {
        assert_eq!(
            parse_blocks("a\nb\n\n\nc"),
            vec![
                Block::Paragraph(vec![text("a"), text("b")]),
                Block::Paragraph(vec![text("c")]),
            ]
        );
    }

    #[test]
    fn markers_need_their_trailing_space() {
        assert_eq!(
            parse_blocks("-item\n1.item\n&gt;quote"),
            vec![Block::Paragraph(vec![
                text("-item"),
                text("1.item"),
                text("&gt;quote"),
            ])]
        );
    }
}
