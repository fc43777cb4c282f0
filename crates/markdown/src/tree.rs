/// Parsed representation of one rendered message body.
///
/// All text stored in the tree is already HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Fenced code; the body is trimmed and never parsed further.
    Code {
        language: Option<String>,
        code: String,
    },
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    BulletList(Vec<Vec<Inline>>),
    OrderedList(Vec<Vec<Inline>>),
    /// One quoted line. Consecutive quote lines stay separate blocks.
    Quote(Vec<Inline>),
    Rule,
    /// Lines of one paragraph, joined by line breaks when serialized.
    Paragraph(Vec<Vec<Inline>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Link { label: Vec<Inline>, href: String },
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Rebuilds container nodes with `f` applied to their children.
    ///
    /// Leaf nodes are returned untouched.
    pub(crate) fn map_children(self, f: &impl Fn(Vec<Inline>) -> Vec<Inline>) -> Self {
        match self {
            Self::Strong(children) => Self::Strong(f(children)),
            Self::Emphasis(children) => Self::Emphasis(f(children)),
            Self::Link { label, href } => Self::Link {
                label: f(label),
                href,
            },
            leaf @ (Self::Text(_) | Self::Code(_)) => leaf,
        }
    }
}
