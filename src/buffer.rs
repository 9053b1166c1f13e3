//! Text of the open block and the inline-significant characters seen in it.
//!
//! Every position is a logical offset: the number of bytes appended to the
//! buffer since the stream started. Dropping an emitted prefix only advances
//! the buffer's origin, so recorded positions never need adjusting.

use std::collections::VecDeque;
use std::ops::Range;

/// Characters the scanner records while in block content.
pub const MARK_CHARS: [char; 13] = [
    '~', '`', '[', ']', '(', ')', '-', '*', '_', '!', '#', '=', ':',
];

pub fn is_mark_char(ch: char) -> bool {
    MARK_CHARS.contains(&ch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub ch: char,
    pub at: usize,
}

/// Work-list of unresolved marks, kept in position order.
///
/// Resolving a mark removes it, so no mark is interpreted twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkList {
    marks: VecDeque<Mark>,
}

impl MarkList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mark: Mark) {
        debug_assert!(self.marks.back().is_none_or(|last| last.at < mark.at));
        self.marks.push_back(mark);
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        self.marks.get(index).copied()
    }

    pub fn front(&self) -> Option<Mark> {
        self.marks.front().copied()
    }

    pub fn pop_front(&mut self) -> Option<Mark> {
        self.marks.pop_front()
    }

    /// Remove the last mark if it records `ch`
    pub fn pop_back_if(&mut self, ch: char) -> Option<Mark> {
        if self.marks.back().is_some_and(|mark| mark.ch == ch) {
            self.marks.pop_back()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter()
    }

    /// Index of the first mark at or after `from` that satisfies `pred`
    pub fn position_from<F>(&self, from: usize, mut pred: F) -> Option<usize>
    where
        F: FnMut(&Mark) -> bool,
    {
        self.marks
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, mark)| pred(mark))
            .map(|(index, _)| index)
    }

    /// True when `count` marks starting at `index` are all `ch` on consecutive bytes
    pub fn is_run(&self, index: usize, ch: char, count: usize) -> bool {
        let Some(first) = self.get(index) else {
            return false;
        };
        (0..count).all(|k| {
            self.get(index + k)
                .is_some_and(|mark| mark.ch == ch && mark.at == first.at + k)
        })
    }

    /// Length of the run of `ch` marks on consecutive bytes starting at `index`
    pub fn run_len(&self, index: usize, ch: char) -> usize {
        let mut len = 0;
        while self.is_run(index, ch, len + 1) {
            len += 1;
        }
        len
    }

    /// Remove and return every mark positioned before `at`
    pub fn split_before(&mut self, at: usize) -> MarkList {
        let count = self.marks.iter().take_while(|mark| mark.at < at).count();
        MarkList {
            marks: self.marks.drain(..count).collect(),
        }
    }

    /// Drop every mark positioned before `at`
    pub fn discard_before(&mut self, at: usize) {
        while self.marks.front().is_some_and(|mark| mark.at < at) {
            self.marks.pop_front();
        }
    }

    pub fn retain<F>(&mut self, pred: F)
    where
        F: FnMut(&Mark) -> bool,
    {
        self.marks.retain(pred);
    }
}

/// A finished block's text handed to the inline resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    source: String,
    origin: usize,
    /// Logical range of the content, syntax and surrounding blanks excluded
    pub content: Range<usize>,
    pub marks: MarkList,
}

impl Span {
    /// Text of a logical range
    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.source[range.start - self.origin..range.end - self.origin]
    }

    pub fn content_text(&self) -> &str {
        self.slice(self.content.clone())
    }

    pub fn is_blank(&self) -> bool {
        self.content.is_empty()
    }

    /// Logical offset of the first `ch` at or after `from`, bounded by the content
    pub fn find_char(&self, from: usize, ch: char) -> Option<usize> {
        self.slice(from..self.content.end)
            .find(ch)
            .map(|index| from + index)
    }

    pub fn byte_at(&self, at: usize) -> Option<u8> {
        if at < self.content.start || at >= self.content.end {
            return None;
        }
        self.source.as_bytes().get(at - self.origin).copied()
    }
}

/// Append-only text of the block currently open.
#[derive(Debug, Clone, Default)]
pub struct BlockBuffer {
    text: String,
    origin: usize,
    marks: MarkList,
}

impl BlockBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn len(&self) -> usize {
        self.text.len()
    }

    /// Logical offset the next appended byte will get
    pub fn end(&self) -> usize {
        self.origin + self.text.len()
    }

    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Append `ch`, recording it when it is inline-significant
    pub fn push_marked(&mut self, ch: char) {
        if is_mark_char(ch) {
            self.marks.push(Mark { ch, at: self.end() });
        }
        self.text.push(ch);
    }

    /// Record a mark for a byte that is already in the buffer
    pub fn mark(&mut self, ch: char, at: usize) {
        self.marks.push(Mark { ch, at });
    }

    /// Forget up to `count` trailing `ch` marks, leaving their bytes as plain text
    pub fn unmark_last(&mut self, ch: char, count: usize) {
        for _ in 0..count {
            if self.marks.pop_back_if(ch).is_none() {
                break;
            }
        }
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.text.ends_with(suffix)
    }

    /// Drop the whole buffer, advancing the origin past it
    pub fn clear(&mut self) {
        self.origin = self.end();
        self.text.clear();
        self.marks = MarkList::new();
    }

    /// Take the whole buffer as raw text
    pub fn take_text(&mut self) -> String {
        self.origin = self.end();
        self.marks = MarkList::new();
        std::mem::take(&mut self.text)
    }

    /// Take the whole buffer as a span, `skip_start`/`skip_end` bytes at either
    /// edge being syntax rather than content.
    pub fn take_span(&mut self, skip_start: usize, skip_end: usize) -> Span {
        let origin = self.origin;
        let len = self.text.len();
        let end = len.saturating_sub(skip_end).max(skip_start.min(len));
        let start = skip_start.min(end);
        let raw = &self.text[start..end];
        let lead = raw.len() - raw.trim_start().len();
        let trail = raw.len() - raw.trim_end().len();
        let content = if lead == raw.len() {
            origin + start..origin + start
        } else {
            origin + start + lead..origin + end - trail
        };

        let mut marks = std::mem::take(&mut self.marks);
        marks.retain(|mark| content.contains(&mark.at));
        let source = std::mem::take(&mut self.text);
        self.origin = origin + len;

        Span {
            source,
            origin,
            content,
            marks,
        }
    }

    /// Split off the first `len` bytes as a span of their own; the rest stays
    /// open as the start of the next block.
    pub fn split_span(&mut self, len: usize, skip_start: usize) -> Option<Span> {
        if len > self.text.len() || !self.text.is_char_boundary(len) {
            return None;
        }
        let rest = self.text.split_off(len);
        let mut head = BlockBuffer {
            text: std::mem::replace(&mut self.text, rest),
            origin: self.origin,
            marks: self.marks.split_before(self.origin + len),
        };
        self.origin += len;
        Some(head.take_span(skip_start, 0))
    }
}
