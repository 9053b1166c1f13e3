//! Inline resolution: turns a finished block's text and marks into inline nodes.
//!
//! Marks are consumed front to back from a work-list. A mark that starts a
//! construct pulls its closing marks (and everything between) out of the
//! list; a mark that starts nothing is simply dropped and its character
//! stays literal.

use crate::ast::Inline;
use crate::autolink;
use crate::buffer::{Mark, MarkList, Span};
use crate::slug::slugify;
use std::ops::Range;

/// Resolve the whole content of a block
pub fn resolve(span: &Span) -> Vec<Inline> {
    let resolver = Resolver {
        span,
        autolink: true,
    };
    resolver.resolve(span.content.clone(), span.marks.clone())
}

/// A construct recognised at a mark, ending before logical offset `end`
struct Resolved {
    node: Inline,
    end: usize,
}

struct Resolver<'a> {
    span: &'a Span,
    autolink: bool,
}

impl<'a> Resolver<'a> {
    /// Link text and image alt never contain bare-URL links
    fn nested(&self) -> Resolver<'a> {
        Resolver {
            span: self.span,
            autolink: false,
        }
    }

    fn resolve(&self, range: Range<usize>, mut marks: MarkList) -> Vec<Inline> {
        let urls = self.find_urls(range.clone());
        marks.retain(|mark| !urls.iter().any(|url| url.contains(&mark.at)));

        let mut nodes = Vec::new();
        let mut cursor = range.start;
        while let Some(mark) = marks.pop_front() {
            let resolved = match mark.ch {
                '~' => self.delete(mark, &mut marks),
                '*' | '_' => self.emphasis(mark, &mut marks),
                '`' => self.code(mark, &mut marks),
                '!' => self.image(mark, &mut marks),
                '[' => self.link(mark, &mut marks, range.end),
                _ => None,
            };
            if let Some(Resolved { node, end }) = resolved {
                self.push_literal(&mut nodes, cursor..mark.at, &urls);
                nodes.push(node);
                cursor = end;
                marks.discard_before(end);
            }
        }
        self.push_literal(&mut nodes, cursor..range.end, &urls);
        nodes
    }

    fn find_urls(&self, range: Range<usize>) -> Vec<Range<usize>> {
        if !self.autolink {
            return Vec::new();
        }
        autolink::find_urls(self.span.slice(range.clone()))
            .into_iter()
            .map(|url| range.start + url.start..range.start + url.end)
            .collect()
    }

    /// Literal text, with any bare URLs inside it turned into links
    fn push_literal(&self, nodes: &mut Vec<Inline>, range: Range<usize>, urls: &[Range<usize>]) {
        let mut cursor = range.start;
        for url in urls
            .iter()
            .filter(|url| url.start >= range.start && url.end <= range.end)
        {
            self.push_text(nodes, cursor..url.start);
            nodes.push(Inline::AutoLink(self.span.slice(url.clone()).to_string()));
            cursor = url.end;
        }
        self.push_text(nodes, cursor..range.end);
    }

    fn push_text(&self, nodes: &mut Vec<Inline>, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let text = self.span.slice(range);
        match nodes.last_mut() {
            Some(Inline::Text(last)) => last.push_str(text),
            _ => nodes.push(Inline::Text(text.to_string())),
        }
    }

    /// `~~text~~`
    fn delete(&self, open: Mark, marks: &mut MarkList) -> Option<Resolved> {
        if !marks
            .front()
            .is_some_and(|next| next.ch == '~' && next.at == open.at + 1)
        {
            return None;
        }
        marks.pop_front();
        let close = (0..marks.len()).find(|&index| marks.is_run(index, '~', 2))?;
        let closer = marks.get(close)?.at;
        if closer == open.at + 2 {
            return None;
        }
        let inner = marks.split_before(closer);
        marks.pop_front();
        marks.pop_front();
        Some(Resolved {
            node: Inline::Delete(self.resolve(open.at + 2..closer, inner)),
            end: closer + 2,
        })
    }

    /// `*em*`, `_em_`, `**strong**`, `__strong__`.
    ///
    /// A doubled opener only ever pairs with a doubled closer, and never with
    /// one directly after it. A closing run of four or more is consumed whole.
    fn emphasis(&self, open: Mark, marks: &mut MarkList) -> Option<Resolved> {
        let ch = open.ch;
        let doubled = marks
            .front()
            .is_some_and(|next| next.ch == ch && next.at == open.at + 1);
        if doubled {
            marks.pop_front();
            let close = (0..marks.len()).find(|&index| marks.is_run(index, ch, 2))?;
            let closer = marks.get(close)?.at;
            if closer == open.at + 2 {
                return None;
            }
            let run = marks.run_len(close, ch);
            let closing = if run >= 4 { run } else { 2 };
            let inner = marks.split_before(closer);
            for _ in 0..closing {
                marks.pop_front();
            }
            return Some(Resolved {
                node: Inline::Strong(self.resolve(open.at + 2..closer, inner)),
                end: closer + closing,
            });
        }

        let close = marks.position_from(0, |mark| mark.ch == ch)?;
        let closer = marks.get(close)?.at;
        let inner = marks.split_before(closer);
        marks.pop_front();
        Some(Resolved {
            node: Inline::Emphasis(self.resolve(open.at + 1..closer, inner)),
            end: closer + 1,
        })
    }

    /// A code span; the scanner only marks backticks that delimit one.
    fn code(&self, open: Mark, marks: &mut MarkList) -> Option<Resolved> {
        let mut ticks = 1;
        while marks
            .front()
            .is_some_and(|next| next.ch == '`' && next.at == open.at + ticks)
        {
            marks.pop_front();
            ticks += 1;
        }
        if !marks.is_run(0, '`', ticks) {
            return None;
        }
        let closer = marks.front()?.at;
        for _ in 0..ticks {
            marks.pop_front();
        }
        Some(Resolved {
            node: Inline::Code(self.span.slice(open.at + ticks..closer).to_string()),
            end: closer + ticks,
        })
    }

    /// `![alt](src)`
    fn image(&self, open: Mark, marks: &mut MarkList) -> Option<Resolved> {
        marks
            .front()
            .filter(|next| next.ch == '[' && next.at == open.at + 1)?;
        let close = matching(marks, 1, '[', ']')?;
        let bracket = marks.get(close)?.at;
        marks
            .get(close + 1)
            .filter(|next| next.ch == '(' && next.at == bracket + 1)?;
        let paren = marks.get(matching(marks, close + 2, '(', ')')?)?.at;

        marks.pop_front();
        let inner = marks.split_before(bracket);
        marks.discard_before(paren + 1);
        Some(Resolved {
            node: Inline::Image {
                destination: self.span.slice(bracket + 2..paren).trim().to_string(),
                alt: self.nested().resolve(open.at + 2..bracket, inner),
            },
            end: paren + 1,
        })
    }

    /// `[text](target)`, `[text][ref]`, `[ref]: target` or the shortcut `[ref]`
    fn link(&self, open: Mark, marks: &mut MarkList, limit: usize) -> Option<Resolved> {
        let close = matching(marks, 0, '[', ']')?;
        let bracket = marks.get(close)?.at;
        let text = open.at + 1..bracket;
        let follower = marks
            .get(close + 1)
            .filter(|next| next.at == bracket + 1)
            .map(|next| next.ch);

        match follower {
            Some('(') => {
                if let Some(paren) = matching(marks, close + 2, '(', ')') {
                    let paren = marks.get(paren)?.at;
                    let inner = marks.split_before(bracket);
                    marks.discard_before(paren + 1);
                    return Some(Resolved {
                        node: Inline::Link {
                            destination: self.span.slice(bracket + 2..paren).trim().to_string(),
                            children: self.nested().resolve(text, inner),
                        },
                        end: paren + 1,
                    });
                }
            }
            Some('[') => {
                if let Some(reference) = marks.position_from(close + 2, |mark| mark.ch == ']') {
                    let reference = marks.get(reference)?.at;
                    let inner = marks.split_before(bracket);
                    marks.discard_before(reference + 1);
                    return Some(Resolved {
                        node: Inline::ReferenceLink {
                            slug: slugify(self.span.slice(bracket + 2..reference)),
                            children: self.nested().resolve(text, inner),
                        },
                        end: reference + 1,
                    });
                }
            }
            Some(':')
                if self
                    .span
                    .byte_at(bracket + 2)
                    .is_some_and(|byte| byte == b' ' || byte == b'\t') =>
            {
                let line_end = self
                    .span
                    .find_char(bracket + 2, '\n')
                    .unwrap_or(self.span.content.end)
                    .min(limit)
                    .max(bracket + 2);
                let label = self.span.slice(text).to_string();
                marks.discard_before(line_end);
                return Some(Resolved {
                    node: Inline::ReferenceDefinition {
                        slug: slugify(&label),
                        destination: self.span.slice(bracket + 2..line_end).trim().to_string(),
                        label,
                    },
                    end: line_end,
                });
            }
            _ => {}
        }

        if text.is_empty() {
            return None;
        }
        let inner = marks.split_before(bracket);
        marks.pop_front();
        Some(Resolved {
            node: Inline::ReferenceLink {
                slug: slugify(self.span.slice(text.clone())),
                children: self.nested().resolve(text, inner),
            },
            end: bracket + 1,
        })
    }
}

/// Index of the `close` mark balancing an already consumed `open`,
/// searching from index `from`
fn matching(marks: &MarkList, from: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (index, mark) in marks.iter().enumerate().skip(from) {
        if mark.ch == open {
            depth += 1;
        } else if mark.ch == close {
            if depth == 0 {
                return Some(index);
            }
            depth -= 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BlockBuffer;
    use pretty_assertions::assert_eq;

    fn inlines(text: &str) -> Vec<Inline> {
        let mut buffer = BlockBuffer::new();
        for ch in text.chars() {
            buffer.push_marked(ch);
        }
        resolve(&buffer.take_span(0, 0))
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(inlines("just words"), vec![text("just words")]);
    }

    #[test]
    fn test_emphasis_pairs_nearest() {
        assert_eq!(
            inlines("*x**x*"),
            vec![
                Inline::Emphasis(vec![text("x")]),
                Inline::Emphasis(vec![text("x")])
            ]
        );
        assert_eq!(
            inlines("*a*b*c*"),
            vec![
                Inline::Emphasis(vec![text("a")]),
                text("b"),
                Inline::Emphasis(vec![text("c")])
            ]
        );
    }

    #[test]
    fn test_strong() {
        assert_eq!(inlines("__x__"), vec![Inline::Strong(vec![text("x")])]);
        assert_eq!(
            inlines("**a**b**c**"),
            vec![
                Inline::Strong(vec![text("a")]),
                text("b"),
                Inline::Strong(vec![text("c")])
            ]
        );
    }

    #[test]
    fn test_long_closing_run_is_consumed() {
        assert_eq!(
            inlines("**a**** b"),
            vec![Inline::Strong(vec![text("a")]), text(" b")]
        );
    }

    #[test]
    fn test_delete() {
        assert_eq!(
            inlines("~~x~~~~x~~"),
            vec![
                Inline::Delete(vec![text("x")]),
                Inline::Delete(vec![text("x")])
            ]
        );
        assert_eq!(inlines("~~x"), vec![text("~~x")]);
        assert_eq!(inlines("x~~"), vec![text("x~~")]);
        assert_eq!(inlines("~x~"), vec![text("~x~")]);
    }

    #[test]
    fn test_empty_pairs_stay_literal() {
        assert_eq!(inlines("****"), vec![text("****")]);
        assert_eq!(inlines("____"), vec![text("____")]);
        assert_eq!(inlines("~~~~"), vec![text("~~~~")]);
        assert_eq!(
            inlines("****x**"),
            vec![text("**"), Inline::Strong(vec![text("x")])]
        );
    }

    #[test]
    fn test_unclosed_delimiters_stay_literal() {
        assert_eq!(inlines("a * b"), vec![text("a * b")]);
        assert_eq!(inlines("**a"), vec![text("**a")]);
    }

    #[test]
    fn test_link() {
        assert_eq!(
            inlines("aaa[example](example.com)bbb"),
            vec![
                text("aaa"),
                Inline::Link {
                    destination: "example.com".to_string(),
                    children: vec![text("example")],
                },
                text("bbb")
            ]
        );
    }

    #[test]
    fn test_link_destination_with_parentheses() {
        assert_eq!(
            inlines("[a](https://x.org/f_(b))"),
            vec![Inline::Link {
                destination: "https://x.org/f_(b)".to_string(),
                children: vec![text("a")],
            }]
        );
    }

    #[test]
    fn test_reference_forms() {
        assert_eq!(
            inlines("[example][example and you]"),
            vec![Inline::ReferenceLink {
                slug: "example-and-you".to_string(),
                children: vec![text("example")],
            }]
        );
        assert_eq!(
            inlines("[EXAMPLE AND YOU]: https://example.com/"),
            vec![Inline::ReferenceDefinition {
                slug: "example-and-you".to_string(),
                destination: "https://example.com/".to_string(),
                label: "EXAMPLE AND YOU".to_string(),
            }]
        );
        assert_eq!(
            inlines("see [Example]"),
            vec![
                text("see "),
                Inline::ReferenceLink {
                    slug: "example".to_string(),
                    children: vec![text("Example")],
                }
            ]
        );
        assert_eq!(inlines("[]"), vec![text("[]")]);
    }

    #[test]
    fn test_definition_ends_at_line() {
        assert_eq!(
            inlines("[a]: x.org\n*b*"),
            vec![
                Inline::ReferenceDefinition {
                    slug: "a".to_string(),
                    destination: "x.org".to_string(),
                    label: "a".to_string(),
                },
                text("\n"),
                Inline::Emphasis(vec![text("b")])
            ]
        );
    }

    #[test]
    fn test_image_inside_link() {
        assert_eq!(
            inlines("[![alt](img.png)](https://x.org/)"),
            vec![Inline::Link {
                destination: "https://x.org/".to_string(),
                children: vec![Inline::Image {
                    destination: "img.png".to_string(),
                    alt: vec![text("alt")],
                }],
            }]
        );
    }

    #[test]
    fn test_image_without_target_is_literal_bang() {
        assert_eq!(
            inlines("wow! [x]"),
            vec![
                text("wow! "),
                Inline::ReferenceLink {
                    slug: "x".to_string(),
                    children: vec![text("x")],
                }
            ]
        );
    }

    #[test]
    fn test_emphasis_containing_link() {
        assert_eq!(
            inlines("_notice me[example](https://example.com/)_"),
            vec![Inline::Emphasis(vec![
                text("notice me"),
                Inline::Link {
                    destination: "https://example.com/".to_string(),
                    children: vec![text("example")],
                }
            ])]
        );
    }

    #[test]
    fn test_bare_urls() {
        assert_eq!(
            inlines("https://gitlab.com/_notmd_"),
            vec![Inline::AutoLink("https://gitlab.com/_notmd_".to_string())]
        );
        assert_eq!(
            inlines("go to example.com now"),
            vec![
                text("go to "),
                Inline::AutoLink("example.com".to_string()),
                text(" now")
            ]
        );
    }

    #[test]
    fn test_no_autolink_inside_link_text() {
        assert_eq!(
            inlines("[https://a.org](https://b.org)"),
            vec![Inline::Link {
                destination: "https://b.org".to_string(),
                children: vec![text("https://a.org")],
            }]
        );
    }
}
