//! Block scanner: a character-level state machine over the input stream.
//!
//! Every decision is made from the current state and the current character
//! alone, so the events produced never depend on how the input was chunked.
//! Syntax characters are appended to the open block's buffer as they are
//! seen; confirming a block only records how much of the buffer is syntax,
//! and rejecting one leaves the characters in place as literal text.

use crate::ast::ListKind;
use crate::buffer::{BlockBuffer, Span};
use crate::error::Error;
use crate::html::{self, TagEffect};

/// Upper bound on how often one character may be handed to another state
const MAX_REPROCESS: usize = 8;

/// Flowing block that continues across lines until a blank line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Paragraph,
    Quote,
}

impl Flow {
    fn content(self) -> ContentKind {
        match self {
            Flow::Paragraph => ContentKind::Paragraph,
            Flow::Quote => ContentKind::Quote,
        }
    }
}

/// Block whose text is being accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Paragraph,
    Quote,
    Heading(u8),
    ListItem,
}

/// A flowing block that a structural line would close, ending at `at`
/// (buffer length before the line's newline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupt {
    flow: Flow,
    at: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Between blocks, skipping blank space
    Free,
    HeadingMarker {
        level: u8,
        interrupt: Option<Interrupt>,
    },
    Text {
        kind: ContentKind,
    },
    /// Start of a continuation line of a paragraph or quote
    LineStart {
        flow: Flow,
        line: usize,
    },
    /// `>` at the start of a block
    QuoteMarker,
    /// `>` continuing a quote onto another line
    QuoteContinuation,
    BulletMarker {
        marker: char,
        count: usize,
        interrupt: Option<Interrupt>,
    },
    ThematicBreak,
    SetextUnderline {
        marker: char,
        count: usize,
        trailing: bool,
        interrupt: Interrupt,
    },
    OrderedMarker {
        start: u32,
        interrupt: Option<Interrupt>,
    },
    OrderedDot {
        start: u32,
        interrupt: Option<Interrupt>,
    },
    FenceOpen {
        ticks: usize,
        interrupt: Option<Interrupt>,
    },
    /// Language tag after an opening fence
    FenceInfo {
        ticks: usize,
        interrupt: Option<Interrupt>,
    },
    FenceBody {
        ticks: usize,
    },
    FenceClose {
        ticks: usize,
        run: usize,
    },
    CodeSpanOpen {
        kind: ContentKind,
        ticks: usize,
    },
    CodeSpan {
        kind: ContentKind,
        ticks: usize,
    },
    CodeSpanClose {
        kind: ContentKind,
        ticks: usize,
        run: usize,
    },
    HtmlTagDetect,
    HtmlTagName,
    HtmlOpenTag {
        quote: Option<char>,
    },
    HtmlBody {
        depth: usize,
    },
}

impl BlockState {
    pub fn name(&self) -> &'static str {
        match self {
            BlockState::Free => "free",
            BlockState::HeadingMarker { .. } => "heading marker",
            BlockState::Text { .. } => "text",
            BlockState::LineStart { .. } => "line start",
            BlockState::QuoteMarker => "quote marker",
            BlockState::QuoteContinuation => "quote continuation",
            BlockState::BulletMarker { .. } => "bullet marker",
            BlockState::ThematicBreak => "thematic break",
            BlockState::SetextUnderline { .. } => "setext underline",
            BlockState::OrderedMarker { .. } => "ordered marker",
            BlockState::OrderedDot { .. } => "ordered dot",
            BlockState::FenceOpen { .. } => "fence open",
            BlockState::FenceInfo { .. } => "fence info",
            BlockState::FenceBody { .. } => "fence body",
            BlockState::FenceClose { .. } => "fence close",
            BlockState::CodeSpanOpen { .. } => "code span open",
            BlockState::CodeSpan { .. } => "code span",
            BlockState::CodeSpanClose { .. } => "code span close",
            BlockState::HtmlTagDetect => "html tag detect",
            BlockState::HtmlTagName => "html tag name",
            BlockState::HtmlOpenTag { .. } => "html open tag",
            BlockState::HtmlBody { .. } => "html body",
        }
    }
}

/// Outcome of one transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The character was used; continue in this state
    Consume(BlockState),
    /// Hand the same character to this state
    Reprocess(BlockState),
}

/// A finished piece of the document
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Paragraph(Span),
    Heading { level: u8, span: Span },
    Quote(Span),
    ListItem { kind: ListKind, span: Span },
    /// The current list run is over
    ListEnd,
    Code { language: String, literal: String },
    Rule,
    Html(String),
}

#[derive(Debug, Clone, Default)]
struct Pending {
    language: String,
    tag: String,
    skip_start: usize,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    state: BlockState,
    buffer: BlockBuffer,
    pending: Pending,
    list: Option<ListKind>,
    events: Vec<Event>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            state: BlockState::Free,
            buffer: BlockBuffer::new(),
            pending: Pending::default(),
            list: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Events completed so far, oldest first
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn feed(&mut self, ch: char) -> Result<(), Error> {
        if ch == '\r' {
            return Ok(());
        }
        for _ in 0..MAX_REPROCESS {
            match self.transition(ch)? {
                Step::Consume(next) => {
                    self.enter(next);
                    return Ok(());
                }
                Step::Reprocess(next) => self.enter(next),
            }
        }
        Err(Error::unexpected(self.state.name(), Some(ch)))
    }

    pub fn feed_str(&mut self, chunk: &str) -> Result<(), Error> {
        chunk.chars().try_for_each(|ch| self.feed(ch))
    }

    /// End of input: close whatever is open, then any list run
    pub fn finish(&mut self) -> Result<(), Error> {
        for _ in 0..MAX_REPROCESS {
            match self.end_of_input()? {
                Some(next) => self.enter(next),
                None => {
                    self.enter(BlockState::Free);
                    self.end_list();
                    return Ok(());
                }
            }
        }
        Err(Error::unexpected(self.state.name(), None))
    }

    fn enter(&mut self, next: BlockState) {
        if next != self.state {
            log::trace!("{} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }

    fn transition(&mut self, ch: char) -> Result<Step, Error> {
        match self.state {
            BlockState::Free => Ok(self.free(ch)),
            BlockState::HeadingMarker { level, interrupt } => {
                self.heading_marker(level, interrupt, ch)
            }
            BlockState::Text { kind } => self.text(kind, ch),
            BlockState::LineStart { flow, line } => self.line_start(flow, line, ch),
            BlockState::QuoteMarker => Ok(self.quote_marker(ch)),
            BlockState::QuoteContinuation => Ok(quote_continuation(ch)),
            BlockState::BulletMarker {
                marker,
                count,
                interrupt,
            } => self.bullet_marker(marker, count, interrupt, ch),
            BlockState::ThematicBreak => Ok(self.thematic_break(ch)),
            BlockState::SetextUnderline {
                marker,
                count,
                trailing,
                interrupt,
            } => self.setext_underline(marker, count, trailing, interrupt, ch),
            BlockState::OrderedMarker { start, interrupt } => {
                Ok(self.ordered_marker(start, interrupt, ch))
            }
            BlockState::OrderedDot { start, interrupt } => {
                self.ordered_dot(start, interrupt, ch)
            }
            BlockState::FenceOpen { ticks, interrupt } => Ok(self.fence_open(ticks, interrupt, ch)),
            BlockState::FenceInfo { ticks, interrupt } => self.fence_info(ticks, interrupt, ch),
            BlockState::FenceBody { ticks } => Ok(self.fence_body(ticks, ch)),
            BlockState::FenceClose { ticks, run } => self.fence_close(ticks, run, ch),
            BlockState::CodeSpanOpen { kind, ticks } => Ok(self.code_span_open(kind, ticks, ch)),
            BlockState::CodeSpan { kind, ticks } => Ok(self.code_span(kind, ticks, ch)),
            BlockState::CodeSpanClose { kind, ticks, run } => {
                Ok(self.code_span_close(kind, ticks, run, ch))
            }
            BlockState::HtmlTagDetect => Ok(self.html_tag_detect(ch)),
            BlockState::HtmlTagName => Ok(self.html_tag_name(ch)),
            BlockState::HtmlOpenTag { quote } => Ok(self.html_open_tag(quote, ch)),
            BlockState::HtmlBody { depth } => self.html_body(depth, ch),
        }
    }

    fn free(&mut self, ch: char) -> Step {
        let next = match ch {
            ' ' | '\t' => BlockState::Free,
            '\n' => {
                self.end_list();
                BlockState::Free
            }
            '#' => BlockState::HeadingMarker {
                level: 1,
                interrupt: None,
            },
            '*' | '-' => BlockState::BulletMarker {
                marker: ch,
                count: 1,
                interrupt: None,
            },
            '0'..='9' => BlockState::OrderedMarker {
                start: digit(ch),
                interrupt: None,
            },
            '>' => BlockState::QuoteMarker,
            '`' => BlockState::FenceOpen {
                ticks: 1,
                interrupt: None,
            },
            '<' => BlockState::HtmlTagDetect,
            _ => {
                return Step::Reprocess(BlockState::Text {
                    kind: ContentKind::Paragraph,
                });
            }
        };
        if !matches!(ch, ' ' | '\t' | '\n') {
            self.buffer.push_marked(ch);
        }
        Step::Consume(next)
    }

    fn heading_marker(
        &mut self,
        level: u8,
        interrupt: Option<Interrupt>,
        ch: char,
    ) -> Result<Step, Error> {
        match ch {
            '#' if level < 6 => {
                self.buffer.push_marked(ch);
                Ok(Step::Consume(BlockState::HeadingMarker {
                    level: level + 1,
                    interrupt,
                }))
            }
            ' ' | '\t' => {
                self.close_interrupted(interrupt)?;
                self.buffer.push(ch);
                self.pending.skip_start = self.buffer.len();
                Ok(Step::Consume(BlockState::Text {
                    kind: ContentKind::Heading(level),
                }))
            }
            _ => Ok(Step::Reprocess(degrade(interrupt))),
        }
    }

    fn text(&mut self, kind: ContentKind, ch: char) -> Result<Step, Error> {
        match (ch, kind) {
            ('\n', ContentKind::Heading(_) | ContentKind::ListItem) => {
                self.close_content(kind)?;
                Ok(Step::Consume(BlockState::Free))
            }
            ('\n', ContentKind::Paragraph | ContentKind::Quote) => {
                let flow = if kind == ContentKind::Quote {
                    Flow::Quote
                } else {
                    Flow::Paragraph
                };
                let line = self.buffer.len();
                self.buffer.push(ch);
                Ok(Step::Consume(BlockState::LineStart { flow, line }))
            }
            ('`', _) => {
                self.buffer.push_marked(ch);
                Ok(Step::Consume(BlockState::CodeSpanOpen { kind, ticks: 1 }))
            }
            _ => {
                self.buffer.push_marked(ch);
                Ok(Step::Consume(BlockState::Text { kind }))
            }
        }
    }

    fn line_start(&mut self, flow: Flow, line: usize, ch: char) -> Result<Step, Error> {
        let interrupt = Interrupt { flow, at: line };
        let next = match ch {
            ' ' | '\t' => {
                self.buffer.push(ch);
                return Ok(Step::Consume(BlockState::LineStart { flow, line }));
            }
            '\n' => {
                self.close_content(flow.content())?;
                return Ok(Step::Consume(BlockState::Free));
            }
            '>' if flow == Flow::Quote => return Ok(Step::Consume(BlockState::QuoteContinuation)),
            '>' => {
                self.close_interrupted(Some(interrupt))?;
                BlockState::QuoteMarker
            }
            '=' | '-' => BlockState::SetextUnderline {
                marker: ch,
                count: 1,
                trailing: false,
                interrupt,
            },
            '*' => BlockState::BulletMarker {
                marker: ch,
                count: 1,
                interrupt: Some(interrupt),
            },
            '#' => BlockState::HeadingMarker {
                level: 1,
                interrupt: Some(interrupt),
            },
            '0'..='9' => BlockState::OrderedMarker {
                start: digit(ch),
                interrupt: Some(interrupt),
            },
            '`' => BlockState::FenceOpen {
                ticks: 1,
                interrupt: Some(interrupt),
            },
            _ => {
                return Ok(Step::Reprocess(BlockState::Text {
                    kind: flow.content(),
                }));
            }
        };
        self.buffer.push_marked(ch);
        Ok(Step::Consume(next))
    }

    fn quote_marker(&mut self, ch: char) -> Step {
        if ch == ' ' {
            self.buffer.push(ch);
            self.pending.skip_start = self.buffer.len();
            return Step::Consume(BlockState::Text {
                kind: ContentKind::Quote,
            });
        }
        self.pending.skip_start = self.buffer.len();
        Step::Reprocess(BlockState::Text {
            kind: ContentKind::Quote,
        })
    }

    fn bullet_marker(
        &mut self,
        marker: char,
        count: usize,
        interrupt: Option<Interrupt>,
        ch: char,
    ) -> Result<Step, Error> {
        let rule = marker == '-' && count >= 3 && interrupt.is_none();
        match ch {
            _ if ch == marker => {
                self.buffer.push_marked(ch);
                Ok(Step::Consume(BlockState::BulletMarker {
                    marker,
                    count: count + 1,
                    interrupt,
                }))
            }
            ' ' | '\t' if count == 1 => self.open_list_item(ListKind::Unordered, interrupt, ch),
            ' ' | '\t' if rule => {
                self.buffer.push(ch);
                Ok(Step::Consume(BlockState::ThematicBreak))
            }
            '\n' if rule => {
                self.close_rule();
                Ok(Step::Consume(BlockState::Free))
            }
            _ => Ok(Step::Reprocess(degrade(interrupt))),
        }
    }

    fn thematic_break(&mut self, ch: char) -> Step {
        match ch {
            ' ' | '\t' => {
                self.buffer.push(ch);
                Step::Consume(BlockState::ThematicBreak)
            }
            '\n' => {
                self.close_rule();
                Step::Consume(BlockState::Free)
            }
            _ => Step::Reprocess(BlockState::Text {
                kind: ContentKind::Paragraph,
            }),
        }
    }

    fn setext_underline(
        &mut self,
        marker: char,
        count: usize,
        trailing: bool,
        interrupt: Interrupt,
        ch: char,
    ) -> Result<Step, Error> {
        match ch {
            _ if ch == marker && !trailing => {
                self.buffer.push_marked(ch);
                Ok(Step::Consume(BlockState::SetextUnderline {
                    marker,
                    count: count + 1,
                    trailing,
                    interrupt,
                }))
            }
            ' ' | '\t' if marker == '-' && count == 1 && !trailing => {
                self.open_list_item(ListKind::Unordered, Some(interrupt), ch)
            }
            ' ' | '\t' => {
                self.buffer.push(ch);
                Ok(Step::Consume(BlockState::SetextUnderline {
                    marker,
                    count,
                    trailing: true,
                    interrupt,
                }))
            }
            '\n' if interrupt.flow == Flow::Paragraph => {
                self.close_setext(marker, interrupt)?;
                Ok(Step::Consume(BlockState::Free))
            }
            _ => Ok(Step::Reprocess(BlockState::Text {
                kind: interrupt.flow.content(),
            })),
        }
    }

    fn ordered_marker(&mut self, start: u32, interrupt: Option<Interrupt>, ch: char) -> Step {
        match ch {
            '0'..='9' => match start.checked_mul(10).and_then(|n| n.checked_add(digit(ch))) {
                Some(start) => {
                    self.buffer.push(ch);
                    Step::Consume(BlockState::OrderedMarker { start, interrupt })
                }
                None => Step::Reprocess(degrade(interrupt)),
            },
            '.' => {
                self.buffer.push(ch);
                Step::Consume(BlockState::OrderedDot { start, interrupt })
            }
            _ => Step::Reprocess(degrade(interrupt)),
        }
    }

    fn ordered_dot(
        &mut self,
        start: u32,
        interrupt: Option<Interrupt>,
        ch: char,
    ) -> Result<Step, Error> {
        match ch {
            ' ' | '\t' => self.open_list_item(ListKind::Ordered { start }, interrupt, ch),
            _ => Ok(Step::Reprocess(degrade(interrupt))),
        }
    }

    fn fence_open(&mut self, ticks: usize, interrupt: Option<Interrupt>, ch: char) -> Step {
        match ch {
            '`' => {
                self.buffer.push_marked(ch);
                Step::Consume(BlockState::FenceOpen {
                    ticks: ticks + 1,
                    interrupt,
                })
            }
            _ if ticks >= 3 => Step::Reprocess(BlockState::FenceInfo { ticks, interrupt }),
            _ => Step::Reprocess(BlockState::CodeSpan {
                kind: flow_kind(interrupt),
                ticks,
            }),
        }
    }

    fn fence_info(
        &mut self,
        ticks: usize,
        interrupt: Option<Interrupt>,
        ch: char,
    ) -> Result<Step, Error> {
        match ch {
            '\n' => {
                self.close_interrupted(interrupt)?;
                let line = self.buffer.take_text();
                let info = line
                    .trim_start()
                    .get(ticks..)
                    .ok_or_else(|| Error::unexpected("fence info", Some(ch)))?;
                self.pending.language = info.trim().to_string();
                Ok(Step::Consume(BlockState::FenceBody { ticks }))
            }
            // A backtick cannot be part of a language tag: this was an inline code span
            '`' => Ok(Step::Reprocess(BlockState::CodeSpan {
                kind: flow_kind(interrupt),
                ticks,
            })),
            _ => {
                self.buffer.push(ch);
                Ok(Step::Consume(BlockState::FenceInfo { ticks, interrupt }))
            }
        }
    }

    fn fence_body(&mut self, ticks: usize, ch: char) -> Step {
        self.buffer.push(ch);
        if ch == '`' {
            Step::Consume(BlockState::FenceClose { ticks, run: 1 })
        } else {
            Step::Consume(BlockState::FenceBody { ticks })
        }
    }

    fn fence_close(&mut self, ticks: usize, run: usize, ch: char) -> Result<Step, Error> {
        if ch == '`' {
            self.buffer.push(ch);
            return Ok(Step::Consume(BlockState::FenceClose {
                ticks,
                run: run + 1,
            }));
        }
        if run >= ticks {
            self.close_fence(ticks)?;
            return Ok(Step::Reprocess(BlockState::Free));
        }
        Ok(Step::Reprocess(BlockState::FenceBody { ticks }))
    }

    fn code_span_open(&mut self, kind: ContentKind, ticks: usize, ch: char) -> Step {
        if ch == '`' {
            self.buffer.push_marked(ch);
            return Step::Consume(BlockState::CodeSpanOpen {
                kind,
                ticks: ticks + 1,
            });
        }
        Step::Reprocess(BlockState::CodeSpan { kind, ticks })
    }

    fn code_span(&mut self, kind: ContentKind, ticks: usize, ch: char) -> Step {
        match ch {
            '`' => {
                self.buffer.push(ch);
                Step::Consume(BlockState::CodeSpanClose { kind, ticks, run: 1 })
            }
            // Code spans stay on one line; the opener falls back to literal text
            '\n' => {
                self.buffer.unmark_last('`', ticks);
                Step::Reprocess(BlockState::Text { kind })
            }
            _ => {
                self.buffer.push(ch);
                Step::Consume(BlockState::CodeSpan { kind, ticks })
            }
        }
    }

    fn code_span_close(&mut self, kind: ContentKind, ticks: usize, run: usize, ch: char) -> Step {
        if ch == '`' {
            self.buffer.push(ch);
            return Step::Consume(BlockState::CodeSpanClose {
                kind,
                ticks,
                run: run + 1,
            });
        }
        if run >= ticks {
            self.mark_code_closer(ticks);
            return Step::Reprocess(BlockState::Text { kind });
        }
        Step::Reprocess(BlockState::CodeSpan { kind, ticks })
    }

    fn html_tag_detect(&mut self, ch: char) -> Step {
        if html::is_tag_name_start(ch) {
            self.pending.tag.clear();
            self.pending.tag.push(ch.to_ascii_lowercase());
            self.buffer.push(ch);
            return Step::Consume(BlockState::HtmlTagName);
        }
        Step::Reprocess(BlockState::Text {
            kind: ContentKind::Paragraph,
        })
    }

    fn html_tag_name(&mut self, ch: char) -> Step {
        if html::is_tag_name_char(ch) {
            self.pending.tag.push(ch.to_ascii_lowercase());
            self.buffer.push(ch);
            return Step::Consume(BlockState::HtmlTagName);
        }
        if ch.is_whitespace() || ch == '>' || ch == '/' {
            return Step::Reprocess(BlockState::HtmlOpenTag { quote: None });
        }
        Step::Reprocess(BlockState::Text {
            kind: ContentKind::Paragraph,
        })
    }

    fn html_open_tag(&mut self, quote: Option<char>, ch: char) -> Step {
        self.buffer.push(ch);
        match (quote, ch) {
            (Some(q), _) if ch == q => Step::Consume(BlockState::HtmlOpenTag { quote: None }),
            (Some(_), _) => Step::Consume(BlockState::HtmlOpenTag { quote }),
            (None, '"' | '\'') => Step::Consume(BlockState::HtmlOpenTag { quote: Some(ch) }),
            (None, '>') => {
                if html::is_void_element(&self.pending.tag) || self.buffer.ends_with("/>") {
                    self.close_html();
                    Step::Consume(BlockState::Free)
                } else {
                    Step::Consume(BlockState::HtmlBody { depth: 1 })
                }
            }
            (None, _) => Step::Consume(BlockState::HtmlOpenTag { quote: None }),
        }
    }

    fn html_body(&mut self, depth: usize, ch: char) -> Result<Step, Error> {
        self.buffer.push(ch);
        if ch != '>' {
            return Ok(Step::Consume(BlockState::HtmlBody { depth }));
        }
        let effect = html::last_tag_effect(self.buffer.text(), &self.pending.tag)
            .ok_or_else(|| Error::unexpected("html body", Some(ch)))?;
        let depth = match effect {
            TagEffect::Closes if depth == 1 => {
                self.close_html();
                return Ok(Step::Consume(BlockState::Free));
            }
            TagEffect::Closes => depth - 1,
            TagEffect::Opens => depth + 1,
            TagEffect::Neither => depth,
        };
        Ok(Step::Consume(BlockState::HtmlBody { depth }))
    }

    /// Force-close the current state. `Some` names the state to continue
    /// closing in, after a pending construct turned out to be literal text.
    fn end_of_input(&mut self) -> Result<Option<BlockState>, Error> {
        let next = match self.state {
            BlockState::Free => None,
            BlockState::Text { kind } => {
                self.close_content(kind)?;
                None
            }
            BlockState::LineStart { flow, .. } => {
                self.close_content(flow.content())?;
                None
            }
            BlockState::QuoteMarker => {
                self.pending.skip_start = self.buffer.len();
                Some(BlockState::Text {
                    kind: ContentKind::Quote,
                })
            }
            BlockState::QuoteContinuation => Some(BlockState::Text {
                kind: ContentKind::Quote,
            }),
            BlockState::HeadingMarker { interrupt, .. }
            | BlockState::OrderedMarker { interrupt, .. }
            | BlockState::OrderedDot { interrupt, .. } => Some(degrade(interrupt)),
            BlockState::BulletMarker {
                marker,
                count,
                interrupt,
            } => {
                if marker == '-' && count >= 3 && interrupt.is_none() {
                    self.close_rule();
                    None
                } else {
                    Some(degrade(interrupt))
                }
            }
            BlockState::ThematicBreak => {
                self.close_rule();
                None
            }
            BlockState::SetextUnderline {
                marker, interrupt, ..
            } => {
                if interrupt.flow == Flow::Paragraph {
                    self.close_setext(marker, interrupt)?;
                    None
                } else {
                    Some(BlockState::Text {
                        kind: ContentKind::Quote,
                    })
                }
            }
            BlockState::FenceOpen { ticks, interrupt }
            | BlockState::FenceInfo { ticks, interrupt } => Some(BlockState::CodeSpan {
                kind: flow_kind(interrupt),
                ticks,
            }),
            BlockState::FenceBody { .. } => {
                log::warn!("input ended inside a code fence");
                self.close_unterminated_fence();
                None
            }
            BlockState::FenceClose { ticks, run } => {
                if run >= ticks {
                    self.close_fence(ticks)?;
                } else {
                    log::warn!("input ended inside a code fence");
                    self.close_unterminated_fence();
                }
                None
            }
            BlockState::CodeSpanOpen { kind, ticks } | BlockState::CodeSpan { kind, ticks } => {
                self.buffer.unmark_last('`', ticks);
                Some(BlockState::Text { kind })
            }
            BlockState::CodeSpanClose { kind, ticks, run } => {
                if run >= ticks {
                    self.mark_code_closer(ticks);
                } else {
                    self.buffer.unmark_last('`', ticks);
                }
                Some(BlockState::Text { kind })
            }
            BlockState::HtmlTagDetect
            | BlockState::HtmlTagName
            | BlockState::HtmlOpenTag { .. } => Some(BlockState::Text {
                kind: ContentKind::Paragraph,
            }),
            BlockState::HtmlBody { .. } => {
                log::warn!("input ended inside <{}>", self.pending.tag);
                self.close_html();
                None
            }
        };
        Ok(next)
    }

    fn emit(&mut self, event: Event) {
        if !matches!(event, Event::ListItem { .. }) {
            self.end_list();
        }
        log::debug!("block complete: {:?}", event);
        self.events.push(event);
    }

    fn end_list(&mut self) {
        if self.list.take().is_some() {
            log::debug!("list run complete");
            self.events.push(Event::ListEnd);
        }
    }

    fn take_span(&mut self, skip_end: usize) -> Span {
        let skip_start = std::mem::take(&mut self.pending.skip_start);
        self.buffer.take_span(skip_start, skip_end)
    }

    fn close_content(&mut self, kind: ContentKind) -> Result<(), Error> {
        let span = self.take_span(0);
        let event = match kind {
            ContentKind::Paragraph if span.is_blank() => return Ok(()),
            ContentKind::Quote if span.is_blank() => return Ok(()),
            ContentKind::Paragraph => Event::Paragraph(span),
            ContentKind::Quote => Event::Quote(span),
            ContentKind::Heading(level) => Event::Heading { level, span },
            ContentKind::ListItem => {
                let kind = self
                    .list
                    .ok_or_else(|| Error::unexpected("list item", None))?;
                Event::ListItem { kind, span }
            }
        };
        self.emit(event);
        Ok(())
    }

    /// Emit the flowing block a structural line interrupts; the line itself
    /// stays in the buffer as the start of the next block.
    fn close_interrupted(&mut self, interrupt: Option<Interrupt>) -> Result<(), Error> {
        let Some(Interrupt { flow, at }) = interrupt else {
            return Ok(());
        };
        let skip_start = std::mem::take(&mut self.pending.skip_start);
        let span = self
            .buffer
            .split_span(at, skip_start)
            .ok_or_else(|| Error::unexpected("line start", None))?;
        if !span.is_blank() {
            self.emit(match flow {
                Flow::Paragraph => Event::Paragraph(span),
                Flow::Quote => Event::Quote(span),
            });
        }
        Ok(())
    }

    fn open_list_item(
        &mut self,
        kind: ListKind,
        interrupt: Option<Interrupt>,
        ch: char,
    ) -> Result<Step, Error> {
        self.close_interrupted(interrupt)?;
        self.buffer.push(ch);
        self.pending.skip_start = self.buffer.len();
        self.list.get_or_insert(kind);
        Ok(Step::Consume(BlockState::Text {
            kind: ContentKind::ListItem,
        }))
    }

    fn close_setext(&mut self, marker: char, interrupt: Interrupt) -> Result<(), Error> {
        let skip_end = self
            .buffer
            .len()
            .checked_sub(interrupt.at)
            .ok_or_else(|| Error::unexpected("setext underline", None))?;
        let span = self.take_span(skip_end);
        let level = if marker == '=' { 1 } else { 2 };
        self.emit(Event::Heading { level, span });
        Ok(())
    }

    fn close_rule(&mut self) {
        self.buffer.clear();
        self.pending.skip_start = 0;
        self.emit(Event::Rule);
    }

    fn close_fence(&mut self, ticks: usize) -> Result<(), Error> {
        let text = self.buffer.take_text();
        let body = text
            .len()
            .checked_sub(ticks)
            .and_then(|end| text.get(..end))
            .ok_or_else(|| Error::unexpected("fence close", None))?;
        let literal = body.trim_end_matches('\n').to_string();
        let language = std::mem::take(&mut self.pending.language);
        self.emit(Event::Code { language, literal });
        Ok(())
    }

    fn close_unterminated_fence(&mut self) {
        let text = self.buffer.take_text();
        let literal = text.trim_end_matches('\n').to_string();
        let language = std::mem::take(&mut self.pending.language);
        self.emit(Event::Code { language, literal });
    }

    /// The last `ticks` backticks in the buffer close the open code span
    fn mark_code_closer(&mut self, ticks: usize) {
        let end = self.buffer.end();
        for at in end - ticks..end {
            self.buffer.mark('`', at);
        }
    }

    fn close_html(&mut self) {
        let html = self.buffer.take_text();
        self.pending.skip_start = 0;
        self.emit(Event::Html(html));
    }
}

fn quote_continuation(ch: char) -> Step {
    let next = BlockState::Text {
        kind: ContentKind::Quote,
    };
    if ch == ' ' {
        Step::Consume(next)
    } else {
        Step::Reprocess(next)
    }
}

/// The state a rejected block marker falls back to: literal text of the
/// block it would have interrupted, or a fresh paragraph.
fn degrade(interrupt: Option<Interrupt>) -> BlockState {
    BlockState::Text {
        kind: flow_kind(interrupt),
    }
}

fn flow_kind(interrupt: Option<Interrupt>) -> ContentKind {
    interrupt.map_or(ContentKind::Paragraph, |it| it.flow.content())
}

fn digit(ch: char) -> u32 {
    ch.to_digit(10).unwrap_or(0)
}
