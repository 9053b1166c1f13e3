use crate::ast::ListKind;

/// Collects rendered items of the current list run until the run ends.
///
/// Items arrive already rendered, so nothing but their HTML is retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListAccumulator {
    kind: Option<ListKind>,
    items: Vec<String>,
}

impl ListAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; the first item of a run decides the run's kind
    pub fn push(&mut self, kind: ListKind, html: String) {
        self.kind.get_or_insert(kind);
        self.items.push(html);
    }

    /// Close the run, returning the wrapped list if it had any items
    pub fn finish(&mut self) -> Option<String> {
        let kind = self.kind.take()?;
        let items = std::mem::take(&mut self.items);
        let body: String = items
            .iter()
            .map(|item| format!("<li>{}</li>", item))
            .collect();
        Some(match kind {
            ListKind::Unordered => format!("<ul>{}</ul>", body),
            ListKind::Ordered { start: 1 } => format!("<ol>{}</ol>", body),
            ListKind::Ordered { start } => format!("<ol start=\"{}\">{}</ol>", start, body),
        })
    }
}
