//! Styled-text to HTML serialization.
//!
//! The buffer is split twice: first into blocks by the paragraph-level spans
//! (which nest properly), then each stretch of inline content by the points
//! where character spans start or end. Inline spans open in creation order
//! and close in reverse, reopening anything cut short by an earlier close.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::buffer::StyledBuffer;
use crate::config::SerializeOptions;
use crate::format::add_source_formatting;
use crate::plugins::PluginSet;
use crate::span::{CommentKind, MediaKind, Span, SpanKind, ZERO_WIDTH_CHAR};

/// Serializes one buffer.
pub struct Serializer<'a> {
    options: &'a SerializeOptions,
    chars: Vec<char>,
    blocks: Vec<&'a Span>,
    inline: Vec<&'a Span>,
    atomic: Vec<&'a Span>,
    cursors: Vec<usize>,
}

impl<'a> Serializer<'a> {
    pub fn new(buffer: &'a StyledBuffer, options: &'a SerializeOptions) -> Self {
        let chars: Vec<char> = buffer.to_plain_string().chars().collect();
        let len = chars.len();

        let mut blocks = Vec::new();
        let mut inline = Vec::new();
        let mut atomic = Vec::new();
        let mut cursors = Vec::new();
        for (_, span) in buffer.closed_spans() {
            let Some(end) = span.end else {
                continue;
            };
            if span.start > end || end > len || span.kind.is_derived() {
                continue;
            }
            match &span.kind {
                SpanKind::Cursor => cursors.push(span.start),
                SpanKind::HorizontalRule => blocks.push(span),
                kind if kind.is_atomic() => atomic.push(span),
                kind if kind.is_block() => blocks.push(span),
                _ if span.start < end => inline.push(span),
                _ => {}
            }
        }

        // Outer blocks first: earlier start, then longer, then older.
        blocks.sort_by_key(|span| (span.start, std::cmp::Reverse(span.end), span.seq));
        atomic.sort_by_key(|span| (span.start, span.seq));
        cursors.sort_unstable();

        Self {
            options,
            chars,
            blocks,
            inline,
            atomic,
            cursors,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_blocks(&mut out, 0..self.chars.len(), &self.blocks, false);
        out
    }

    fn write_blocks(&self, out: &mut String, range: Range<usize>, blocks: &[&Span], pre: bool) {
        let mut pos = range.start;
        let mut idx = 0;
        while idx < blocks.len() {
            let block = blocks[idx];
            let end = block.end.unwrap_or(block.start);

            let mut next = idx + 1;
            while next < blocks.len() && contains(block, blocks[next]) {
                next += 1;
            }

            if block.start > pos {
                // The newline that moved the block onto its own line is not content.
                let mut gap_end = block.start.min(range.end);
                if gap_end > pos && self.chars[gap_end - 1] == '\n' {
                    gap_end -= 1;
                }
                self.write_inline(out, pos..gap_end, pre);
            }
            self.write_block(out, block, &blocks[idx + 1..next], pre);
            pos = pos.max(end);
            idx = next;
        }
        if pos < range.end {
            self.write_inline(out, pos..range.end, pre);
        }
    }

    fn write_block(&self, out: &mut String, block: &Span, children: &[&Span], pre: bool) {
        let start = block.start;
        let end = block.end.unwrap_or(start);
        let inner_end = if end > start && self.chars[end - 1] == '\n' {
            end - 1
        } else {
            end
        };
        let inner = start..inner_end;

        match &block.kind {
            SpanKind::HorizontalRule => out.push_str(&block.opening_tag()),
            SpanKind::CommentBlock { opening, closing } => {
                push_comment(out, opening);
                self.write_blocks(out, inner, children, pre);
                if let Some(closing) = closing {
                    push_comment(out, closing);
                }
            }
            kind => {
                out.push_str(&block.opening_tag());
                let pre = pre || kind.preserves_whitespace();
                self.write_blocks(out, inner, children, pre);
                out.push_str(&block.closing_tag());
            }
        }
    }

    fn write_inline(&self, out: &mut String, range: Range<usize>, pre: bool) {
        if range.start > range.end {
            return;
        }

        let clip = |span: &Span| {
            let end = span.end.unwrap_or(span.start);
            span.start.max(range.start)..end.min(range.end)
        };

        let inline: Vec<&Span> = self
            .inline
            .iter()
            .copied()
            .filter(|span| !clip(span).is_empty())
            .collect();
        let atomic: Vec<&Span> = self
            .atomic
            .iter()
            .copied()
            .filter(|span| {
                let end = span.end.unwrap_or(span.start);
                if span.start == end {
                    range.contains(&span.start) || span.start == range.end
                } else {
                    range.contains(&span.start)
                }
            })
            .collect();
        let cursors: Vec<usize> = if self.options.with_cursor {
            self.cursors
                .iter()
                .copied()
                .filter(|at| (range.start..=range.end).contains(at))
                .collect()
        } else {
            Vec::new()
        };

        let mut points = BTreeSet::from([range.start, range.end]);
        for span in &inline {
            let r = clip(span);
            points.insert(r.start);
            points.insert(r.end);
        }
        for span in &atomic {
            points.insert(span.start);
            points.insert(span.end.unwrap_or(span.start).min(range.end));
        }
        points.extend(cursors.iter().copied());
        let points: Vec<usize> = points.into_iter().collect();

        let mut open: Vec<&Span> = Vec::new();
        let mut skip_until = range.start;
        for (idx, &at) in points.iter().enumerate() {
            if let Some(first) = open.iter().position(|span| clip(span).end <= at) {
                for span in open[first..].iter().rev() {
                    out.push_str(&span.closing_tag());
                }
                let reopen: Vec<&Span> = open
                    .drain(first..)
                    .filter(|span| clip(span).end > at)
                    .collect();
                for span in &reopen {
                    out.push_str(&span.opening_tag());
                }
                open.extend(reopen);
            }

            for span in atomic
                .iter()
                .filter(|span| span.start == at && span.end == Some(at))
            {
                self.write_atomic(out, span);
            }
            for _ in cursors.iter().filter(|c| **c == at) {
                let tag = self.options.cursor_tag();
                out.push_str(&format!("<{tag}></{tag}>"));
            }

            let Some(&next) = points.get(idx + 1) else {
                break;
            };

            let mut starting: Vec<&Span> = inline
                .iter()
                .copied()
                .filter(|span| clip(span).start == at)
                .collect();
            starting.sort_by_key(|span| span.seq);
            for span in starting {
                out.push_str(&span.opening_tag());
                open.push(span);
            }

            if let Some(span) = atomic
                .iter()
                .find(|span| span.start == at && span.end.is_some_and(|end| end > at))
            {
                self.write_atomic(out, span);
                skip_until = skip_until.max(span.end.unwrap_or(at));
            }

            let from = at.max(skip_until);
            if from < next {
                let preserve = pre || open.iter().any(|span| span.kind.preserves_whitespace());
                escape_text(&self.chars[from..next], preserve, out);
            }
        }

        for span in open.iter().rev() {
            out.push_str(&span.closing_tag());
        }
    }

    fn write_atomic(&self, out: &mut String, span: &Span) {
        match &span.kind {
            SpanKind::UnknownHtml(raw) => out.push_str(raw),
            SpanKind::HiddenComment(text) => push_comment(out, text),
            SpanKind::Comment(CommentKind::More) => push_comment(out, "more"),
            SpanKind::Comment(CommentKind::PageBreak) => push_comment(out, "nextpage"),
            SpanKind::Comment(CommentKind::Plain) => {
                let end = span.end.unwrap_or(span.start);
                let text: String = self.chars[span.start..end].iter().collect();
                push_comment(out, &text);
            }
            SpanKind::Media {
                kind: MediaKind::Image,
                ..
            } => out.push_str(&span.opening_tag()),
            SpanKind::Media { children, .. } => {
                out.push_str(&span.opening_tag());
                out.push_str(children);
                out.push_str(&span.closing_tag());
            }
            _ => {}
        }
    }
}

fn contains(outer: &Span, inner: &Span) -> bool {
    let outer_end = outer.end.unwrap_or(outer.start);
    let inner_end = inner.end.unwrap_or(inner.start);
    outer.start <= inner.start && inner_end <= outer_end
}

fn push_comment(out: &mut String, text: &str) {
    out.push_str("<!--");
    out.push_str(text);
    out.push_str("-->");
}

/// Escape plain text for HTML output.
///
/// Markup characters become entities and anything outside printable ASCII
/// becomes a numeric reference. Newlines become `<br>`. Runs of spaces turn
/// into `&nbsp;` except the last one. With `preserve`, newlines and spaces
/// pass through as-is.
pub fn escape_text(text: &[char], preserve: bool, out: &mut String) {
    let mut idx = 0;
    while idx < text.len() {
        let c = text[idx];
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            ZERO_WIDTH_CHAR => {}
            '\n' if preserve => out.push('\n'),
            '\n' => out.push_str("<br>"),
            ' ' if preserve => out.push(' '),
            ' ' => {
                while idx + 1 < text.len() && text[idx + 1] == ' ' {
                    out.push_str("&nbsp;");
                    idx += 1;
                }
                out.push(' ');
            }
            c if c > '\u{7E}' || c < ' ' => {
                out.push_str(&format!("&#{};", c as u32));
            }
            c => out.push(c),
        }
        idx += 1;
    }
}

/// Serialize `buffer`, run HTML postprocessors, and optionally pretty-print.
pub fn to_html(buffer: &StyledBuffer, options: &SerializeOptions, plugins: &PluginSet) -> String {
    let html = Serializer::new(buffer, options).to_html();
    let html = plugins.postprocess(html);
    if options.source_format {
        add_source_formatting(&html)
    } else {
        html
    }
}
