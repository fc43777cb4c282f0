use crate::tree::Inline;

/// One unit of inline input: a character still open to matching, or a node
/// produced by an earlier pass that later passes treat as opaque.
#[derive(Debug, Clone)]
enum Atom {
    Char(char),
    Node(Inline),
}

impl Atom {
    fn is_char(&self, expected: char) -> bool {
        matches!(self, Self::Char(ch) if *ch == expected)
    }
}

/// Parses one line of escaped text into inline nodes.
///
/// Passes run in a fixed order: code spans, links, `**`, `__`, `*`, `_`.
/// Code span bodies and link targets are never seen by the emphasis passes.
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let nodes = code_spans(line);
    let nodes = links(nodes);
    let nodes = delimited(nodes, "**", Inline::Strong);
    let nodes = delimited(nodes, "__", Inline::Strong);
    let nodes = delimited(nodes, "*", Inline::Emphasis);
    delimited(nodes, "_", Inline::Emphasis)
}

fn code_spans(line: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    let mut rest = line;

    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        match after.find('`') {
            // "``" has no body; the first tick stays literal and matching resumes at the second.
            Some(0) => {
                text.push_str(&rest[..=open]);
                rest = after;
            }
            Some(close) => {
                text.push_str(&rest[..open]);
                flush_text(&mut nodes, &mut text);
                nodes.push(Inline::Code(after[..close].to_string()));
                rest = &after[close + 1..];
            }
            None => break,
        }
    }

    text.push_str(rest);
    flush_text(&mut nodes, &mut text);
    nodes
}

fn links(nodes: Vec<Inline>) -> Vec<Inline> {
    let atoms = to_atoms(nodes);
    let mut out = Vec::with_capacity(atoms.len());
    let mut index = 0;

    while index < atoms.len() {
        if atoms[index].is_char('[')
            && let Some((label_end, href, next)) = match_link(&atoms, index)
        {
            out.push(Atom::Node(Inline::Link {
                label: from_atoms(atoms[index + 1..label_end].to_vec()),
                href,
            }));
            index = next;
            continue;
        }

        out.push(atoms[index].clone());
        index += 1;
    }

    from_atoms(out)
}

/// Matches `[label](target)` starting at `open`.
///
/// Returns the index of the closing `]`, the target text and the index just
/// past the closing `)`.
fn match_link(atoms: &[Atom], open: usize) -> Option<(usize, String, usize)> {
    let label_end = (open + 1..atoms.len()).find(|&index| atoms[index].is_char(']'))?;
    if label_end == open + 1 || !atoms.get(label_end + 1)?.is_char('(') {
        return None;
    }

    let mut href = String::new();
    let mut index = label_end + 2;
    loop {
        match atoms.get(index)? {
            Atom::Char(')') => break,
            Atom::Char(ch) => href.push(*ch),
            Atom::Node(_) => return None,
        }
        index += 1;
    }

    if href.is_empty() {
        return None;
    }

    Some((label_end, href, index + 1))
}

/// Wraps the shortest non-empty run between two `delimiter`s with `wrap`.
///
/// Children of nodes from earlier passes are processed first; the body of a
/// fresh match is not re-scanned for the same delimiter.
fn delimited(nodes: Vec<Inline>, delimiter: &str, wrap: fn(Vec<Inline>) -> Inline) -> Vec<Inline> {
    let recurse = |children: Vec<Inline>| delimited(children, delimiter, wrap);
    let nodes = nodes
        .into_iter()
        .map(|node| node.map_children(&recurse))
        .collect::<Vec<_>>();

    let pattern = delimiter.chars().collect::<Vec<_>>();
    let atoms = to_atoms(nodes);
    let mut out = Vec::with_capacity(atoms.len());
    let mut index = 0;

    while index < atoms.len() {
        if starts_with(&atoms, index, &pattern) {
            let body_start = index + pattern.len();
            let close = (body_start + 1..atoms.len())
                .find(|&candidate| starts_with(&atoms, candidate, &pattern));

            if let Some(close) = close {
                out.push(Atom::Node(wrap(from_atoms(
                    atoms[body_start..close].to_vec(),
                ))));
                index = close + pattern.len();
                continue;
            }
        }

        out.push(atoms[index].clone());
        index += 1;
    }

    from_atoms(out)
}

fn starts_with(atoms: &[Atom], at: usize, pattern: &[char]) -> bool {
    atoms.len() >= at + pattern.len()
        && pattern
            .iter()
            .enumerate()
            .all(|(offset, ch)| atoms[at + offset].is_char(*ch))
}

fn to_atoms(nodes: Vec<Inline>) -> Vec<Atom> {
    let mut atoms = Vec::new();
    for node in nodes {
        match node {
            Inline::Text(text) => atoms.extend(text.chars().map(Atom::Char)),
            other => atoms.push(Atom::Node(other)),
        }
    }
    atoms
}

fn from_atoms(atoms: Vec<Atom>) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    for atom in atoms {
        match atom {
            Atom::Char(ch) => text.push(ch),
            Atom::Node(node) => {
                flush_text(&mut nodes, &mut text);
                nodes.push(node);
            }
        }
    }
    flush_text(&mut nodes, &mut text);
    nodes
}

fn flush_text(nodes: &mut Vec<Inline>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(Inline::Text(std::mem::take(text)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Inline {
        Inline::text(value)
    }

    #[test]
    fn bold_runs_before_italic() {
        assert_eq!(
            parse_inline("**bold** and *italic*"),
            vec![
                Inline::Strong(vec![text("bold")]),
                text(" and "),
                Inline::Emphasis(vec![text("italic")]),
            ]
        );
    }

    #[test]
    fn underscore_forms_match_star_forms() {
        assert_eq!(
            parse_inline("__a__ _b_"),
            vec![
                Inline::Strong(vec![text("a")]),
                text(" "),
                Inline::Emphasis(vec![text("b")]),
            ]
        );
    }

    #[test]
    fn code_span_body_is_opaque() {
        assert_eq!(
            parse_inline("run `**not bold**` now"),
            vec![
                text("run "),
                Inline::Code("**not bold**".to_string()),
                text(" now"),
            ]
        );
    }

    #[test]
    fn empty_code_span_keeps_ticks_literal() {
        assert_eq!(
            parse_inline("``a`"),
            vec![text("`"), Inline::Code("a".to_string())]
        );
        assert_eq!(parse_inline("a ` b"), vec![text("a ` b")]);
    }

    #[test]
    fn emphasis_may_wrap_code_spans() {
        assert_eq!(
            parse_inline("**a `b` c**"),
            vec![Inline::Strong(vec![
                text("a "),
                Inline::Code("b".to_string()),
                text(" c"),
            ])]
        );
    }

    #[test]
    fn link_target_is_not_reparsed() {
        assert_eq!(
            parse_inline("[the **docs**](https://x.dev/a_b_c*d*)"),
            vec![Inline::Link {
                label: vec![text("the "), Inline::Strong(vec![text("docs")])],
                href: "https://x.dev/a_b_c*d*".to_string(),
            }]
        );
    }

    #[test]
    fn incomplete_links_stay_literal() {
        assert_eq!(parse_inline("[]()"), vec![text("[]()")]);
        assert_eq!(parse_inline("[a](b"), vec![text("[a](b")]);
        assert_eq!(parse_inline("[a] (b)"), vec![text("[a] (b)")]);
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert_eq!(parse_inline("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(parse_inline("**open"), vec![text("**open")]);
    }
}
