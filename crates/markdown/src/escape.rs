/// Escapes the three characters that could open markup in rendered text.
///
/// This runs once over the raw input before any structural parsing, so every
/// node in the tree carries already-escaped text.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Makes already-escaped text safe inside a double-quoted attribute value.
///
/// `&`, `<` and `>` were handled by [`escape_text`]; only the quote is left.
pub fn escape_attribute(escaped: &str) -> String {
    escaped.replace('"', "&quot;")
}

/// Returns true when an (escaped) link target may be emitted as an `href`.
///
/// Relative targets and `http`, `https` and `mailto` schemes pass; anything
/// else (`javascript:`, `data:`, ...) does not.
pub fn is_safe_href(href: &str) -> bool {
    let trimmed = href.trim();
    let Some((scheme, _)) = trimmed.split_once(':') else {
        return true;
    };

    // A colon after a path or query separator is not a scheme delimiter.
    if scheme.contains(['/', '?', '#']) {
        return true;
    }

    matches!(
        scheme.to_ascii_lowercase().as_str(),
        "http" | "https" | "mailto"
    )
}
