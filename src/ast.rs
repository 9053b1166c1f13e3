/// Node types for finished blocks and their resolved inline content
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        children: Vec<Inline>,
    },
    CodeBlock {
        language: String, // Empty when the fence carried no tag
        literal: String,
    },
    ThematicBreak,
    BlockQuote(Vec<Inline>),
    HtmlBlock(String), // Raw HTML (passed through unchanged)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Text(String),
    Code(String),        // Inline code span, escaped only
    Emphasis(Vec<Inline>), // <em> tag
    Strong(Vec<Inline>), // <strong> tag
    Delete(Vec<Inline>), // <del> tag
    Link {
        destination: String,
        children: Vec<Inline>,
    },
    /// `[text][ref]` or `[text]`, pointing at the fragment of a definition
    ReferenceLink {
        slug: String,
        children: Vec<Inline>,
    },
    /// `[ref]: target`, rendered in place as the anchor other links point at
    ReferenceDefinition {
        slug: String,
        destination: String,
        label: String,
    },
    Image {
        destination: String,
        alt: Vec<Inline>, // Alt text can contain inline elements
    },
    AutoLink(String), // Bare URL found in literal text
}

/// Marker kind of a list run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Unordered,
    Ordered { start: u32 },
}

impl ListKind {
    pub fn is_ordered(&self) -> bool {
        matches!(self, ListKind::Ordered { .. })
    }
}

impl Inline {
    /// Plain text content, with all markup dropped
    pub fn plain_text(nodes: &[Inline]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                Inline::Text(text) | Inline::Code(text) | Inline::AutoLink(text) => {
                    out.push_str(text)
                }
                Inline::ReferenceDefinition { label, .. } => out.push_str(label),
                Inline::Emphasis(children)
                | Inline::Strong(children)
                | Inline::Delete(children)
                | Inline::Link { children, .. }
                | Inline::ReferenceLink { children, .. } => {
                    out.push_str(&Inline::plain_text(children))
                }
                Inline::Image { alt, .. } => out.push_str(&Inline::plain_text(alt)),
            }
        }
        out
    }
}
