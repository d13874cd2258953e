//! The styled buffer: a text arena plus the spans anchored over it.
//!
//! Spans live in an index arena and refer to the text only by char offsets.
//! Open spans are tracked in one stack per kind, so closing a kind pops the
//! most recently opened span of that kind regardless of what else is open.

use std::collections::HashMap;
use std::mem::Discriminant;
use std::ops::Range;

use smol_str::SmolStr;

use crate::attributes::Attributes;
use crate::error::{ConvertError, Result};
use crate::span::{Span, SpanId, SpanKind, ZERO_WIDTH_CHAR};
use crate::text::{RopeText, TextBuffer};

/// Mutable character sequence with formatting spans.
#[derive(Debug, Clone, Default)]
pub struct StyledBuffer {
    text: RopeText,
    spans: Vec<Option<Span>>,
    open: HashMap<Discriminant<SpanKind>, Vec<SpanId>>,
    next_seq: u64,
    /// Offset of the last newline appended as a block separator.
    separator: Option<usize>,
}

impl StyledBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text with no spans.
    pub fn from_text(text: &str) -> Self {
        Self {
            text: RopeText::from_str(text),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &RopeText {
        &self.text
    }

    pub fn to_plain_string(&self) -> String {
        self.text.to_string()
    }

    pub fn last_char(&self) -> Option<char> {
        self.text.last_char()
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.char_at(offset)
    }

    pub fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        self.text.slice(range)
    }

    /// Append text. Open spans grow implicitly since their end is unset.
    pub fn push_str(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.push(text);
        }
    }

    pub fn push_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.text.push(c.encode_utf8(&mut buf));
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn alloc(&mut self, span: Span) -> SpanId {
        let id = SpanId(self.spans.len());
        self.spans.push(Some(span));
        id
    }

    /// Open a span at the current end of the buffer.
    pub fn open(
        &mut self,
        kind: SpanKind,
        tag: impl Into<SmolStr>,
        attrs: Attributes,
        nesting: usize,
    ) -> SpanId {
        let key = kind.key();
        let seq = self.next_seq();
        let id = self.alloc(Span {
            kind,
            tag: tag.into(),
            attrs,
            start: self.len(),
            end: None,
            seq,
            nesting,
        });
        self.open.entry(key).or_default().push(id);
        id
    }

    /// Most recently opened, still open span of this kind.
    pub fn peek_open(&self, kind: &SpanKind) -> Option<&Span> {
        self.get(self.peek_open_id(kind)?)
    }

    pub fn peek_open_id(&self, kind: &SpanKind) -> Option<SpanId> {
        self.open.get(&kind.key())?.last().copied()
    }

    /// Close the most recently opened span of this kind at the current end.
    ///
    /// Returns the closed span, or `None` when nothing of this kind was open
    /// or the span turned out empty and was discarded.
    pub fn close(&mut self, kind: &SpanKind) -> Result<Option<SpanId>> {
        if kind.is_derived() || matches!(kind, SpanKind::Cursor) {
            return Err(ConvertError::UnsupportedStyle { kind: kind.name() });
        }

        let Some(id) = self.open.get_mut(&kind.key()).and_then(Vec::pop) else {
            tracing::debug!(kind = kind.name(), "close without open span, ignoring");
            return Ok(None);
        };

        let len = self.len();
        let Some(span) = self.get_mut(id) else {
            return Ok(None);
        };
        span.end = Some(len);
        if span.start == len {
            self.remove(id);
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Open a paragraph-level span on a fresh line.
    pub fn open_block(
        &mut self,
        kind: SpanKind,
        tag: impl Into<SmolStr>,
        attrs: Attributes,
        nesting: usize,
    ) -> SpanId {
        self.push_separator();
        self.open(kind, tag, attrs, nesting)
    }

    /// Close a paragraph-level span so that it ends with a separator newline.
    ///
    /// An empty block gets a zero-width filler first, so it is not discarded.
    /// So does a block whose content ends with a newline (from `<br>`), which
    /// keeps that newline from reading as a blank line in the finalize trim.
    pub fn close_block(&mut self, kind: &SpanKind) -> Result<Option<SpanId>> {
        if let Some(span) = self.peek_open(kind) {
            let empty = span.start == self.len();
            let content_newline = self.last_char() == Some('\n') && !self.ends_with_separator();
            if empty || content_newline {
                self.push_char(ZERO_WIDTH_CHAR);
            }
            self.push_separator();
        }
        self.close(kind)
    }

    /// Whether the buffer ends with a newline added by [`push_separator`].
    ///
    /// [`push_separator`]: Self::push_separator
    pub fn ends_with_separator(&self) -> bool {
        self.separator
            .is_some_and(|at| at + 1 == self.len() && self.last_char() == Some('\n'))
    }

    /// Append a separator newline unless the buffer is empty or already
    /// ends with one. Block spans own their trailing separator, and the
    /// serializer drops it instead of writing `<br>`.
    pub fn push_separator(&mut self) {
        if self.is_empty() || self.ends_with_separator() {
            return;
        }
        self.separator = Some(self.len());
        self.push_char('\n');
    }

    /// Close every span still open at the current end, discarding empty ones.
    /// Returns how many spans were left open.
    pub fn close_all(&mut self) -> usize {
        let len = self.len();
        let ids: Vec<SpanId> = self.open.drain().flat_map(|(_, ids)| ids).collect();
        let count = ids.len();
        for id in ids {
            let Some(span) = self.get_mut(id) else {
                continue;
            };
            span.end = Some(len);
            if span.start == len {
                self.remove(id);
            }
        }
        count
    }

    /// Attach an already closed span over `range`. Zero-length ranges are kept.
    pub fn attach(
        &mut self,
        kind: SpanKind,
        tag: impl Into<SmolStr>,
        attrs: Attributes,
        range: Range<usize>,
        nesting: usize,
    ) -> SpanId {
        let seq = self.next_seq();
        self.alloc(Span {
            kind,
            tag: tag.into(),
            attrs,
            start: range.start,
            end: Some(range.end),
            seq,
            nesting,
        })
    }

    pub fn remove(&mut self, id: SpanId) -> Option<Span> {
        let span = self.spans.get_mut(id.0)?.take()?;
        if span.is_open() {
            if let Some(stack) = self.open.get_mut(&span.kind.key()) {
                stack.retain(|open| *open != id);
            }
        }
        Some(span)
    }

    pub fn get(&self, id: SpanId) -> Option<&Span> {
        self.spans.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SpanId) -> Option<&mut Span> {
        self.spans.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live spans in creation order.
    pub fn spans(&self) -> impl Iterator<Item = (SpanId, &Span)> {
        self.spans
            .iter()
            .enumerate()
            .filter_map(|(idx, span)| span.as_ref().map(|s| (SpanId(idx), s)))
    }

    /// Live, closed spans in creation order.
    pub fn closed_spans(&self) -> impl Iterator<Item = (SpanId, &Span)> {
        self.spans().filter(|(_, span)| !span.is_open())
    }

    /// Spans of any kind still open. Empty after a complete conversion.
    pub fn open_spans(&self) -> impl Iterator<Item = (SpanId, &Span)> {
        self.spans().filter(|(_, span)| span.is_open())
    }

    /// Insert text at `offset`, shifting and growing spans.
    ///
    /// A span ending exactly at `offset` grows to include the new text,
    /// except atomic spans. A span starting at `offset` is pushed right
    /// unless it is empty, in which case it grows.
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        let inserted = text.chars().count();
        if inserted == 0 {
            return;
        }
        self.text.insert(offset, text);
        self.separator = None;

        for span in self.spans.iter_mut().flatten() {
            let Some(end) = span.end else {
                continue;
            };
            let atomic = span.kind.is_atomic() || matches!(span.kind, SpanKind::Cursor);
            if span.start > offset || (span.start == offset && (end > offset || atomic)) {
                span.start += inserted;
                span.end = Some(end + inserted);
            } else if end > offset || (end == offset && !atomic) {
                span.end = Some(end + inserted);
            }
        }
    }

    /// Delete a char range, clamping spans into it.
    ///
    /// Inline spans that collapse to nothing are dropped. Block spans and
    /// cursor markers survive empty.
    pub fn delete_range(&mut self, range: Range<usize>) {
        let range = range.start.min(self.len())..range.end.min(self.len());
        if range.is_empty() {
            return;
        }
        self.text.delete(range.clone());
        self.separator = None;

        let removed = range.len();
        let map = |pos: usize| {
            if pos <= range.start {
                pos
            } else if pos >= range.end {
                pos - removed
            } else {
                range.start
            }
        };

        for slot in self.spans.iter_mut() {
            let Some(span) = slot else {
                continue;
            };
            let Some(end) = span.end else {
                continue;
            };
            let was_empty = span.start == end;
            span.start = map(span.start);
            let end = map(end);
            span.end = Some(end);
            let keep = span.kind.is_block() || matches!(span.kind, SpanKind::Cursor);
            if span.start == end && !was_empty && !keep {
                *slot = None;
            }
        }
    }
}
