//! State tracked across parser events during a conversion.

use crate::attributes::Attributes;
use crate::span::SpanId;

/// Verbatim capture of markup the converter does not interpret.
///
/// Two things get captured: everything under an unknown tag (the tag itself
/// included), and the children of a `<video>`/`<audio>` element. Only one
/// chain is captured at a time. Everything below the outermost tag, known
/// tags included, lands in `raw` until its depth returns to zero.
#[derive(Debug, Default)]
pub(crate) struct RawCapture {
    raw: String,
    depth: usize,
    /// Buffer offset of the placeholder the capture belongs to.
    anchor: usize,
    /// Media span receiving the markup, when capturing media children.
    media: Option<SpanId>,
}

/// The result of a finished capture.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Captured {
    Unknown(String),
    MediaChildren { span: SpanId, raw: String },
}

impl RawCapture {
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Start capturing an unknown element, its own start tag first.
    pub fn begin(&mut self, name: &str, attrs: &Attributes, anchor: usize) {
        self.raw.clear();
        self.depth = 0;
        self.anchor = anchor;
        self.media = None;
        self.push_start_tag(name, attrs, true);
    }

    /// Start capturing the children of an already placed media span. The
    /// media element's own tags are not part of the capture.
    pub fn begin_media(&mut self, span: SpanId, anchor: usize) {
        self.raw.clear();
        self.depth = 1;
        self.anchor = anchor;
        self.media = Some(span);
    }

    /// Record a start tag. Void elements do not nest.
    pub fn push_start_tag(&mut self, name: &str, attrs: &Attributes, nests: bool) {
        self.raw.push('<');
        self.raw.push_str(name);
        self.raw.push_str(&attrs.serialize());
        self.raw.push('>');
        if nests {
            self.depth += 1;
        }
    }

    /// Record an end tag. Returns true when the outermost tag closed.
    pub fn push_end_tag(&mut self, name: &str) -> bool {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 || self.media.is_none() {
            self.raw.push_str("</");
            self.raw.push_str(name);
            self.raw.push('>');
        }
        self.depth == 0
    }

    pub fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '<' => self.raw.push_str("&lt;"),
                '>' => self.raw.push_str("&gt;"),
                '&' => self.raw.push_str("&amp;"),
                _ => self.raw.push(c),
            }
        }
    }

    pub fn push_comment(&mut self, text: &str) {
        self.raw.push_str("<!--");
        self.raw.push_str(text);
        self.raw.push_str("-->");
    }

    /// Take the captured markup and leave capture mode.
    pub fn finish(&mut self) -> Captured {
        self.depth = 0;
        let raw = std::mem::take(&mut self.raw);
        match self.media.take() {
            Some(span) => Captured::MediaChildren { span, raw },
            None => Captured::Unknown(raw),
        }
    }
}

/// Nested `pre`/`code` regions that suppress whitespace collapsing.
#[derive(Debug, Default)]
pub(crate) struct WhitespaceState {
    preserve_depth: usize,
}

impl WhitespaceState {
    pub fn enter(&mut self) {
        self.preserve_depth += 1;
    }

    pub fn exit(&mut self) {
        self.preserve_depth = self.preserve_depth.saturating_sub(1);
    }

    pub fn preserves(&self) -> bool {
        self.preserve_depth > 0
    }
}

/// Collapse runs of spaces and newlines in `text` into single spaces.
///
/// Tabs and other control whitespace are content and pass through.
/// `pred` is the character emitted just before this chunk, so runs that
/// straddle chunk boundaries still collapse. A chunk at the very start of
/// the buffer or after a newline drops its leading whitespace.
pub(crate) fn collapse_whitespace(text: &str, pred: Option<char>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = pred.unwrap_or('\n');
    for c in text.chars() {
        if is_collapsible(c) {
            if last != ' ' && last != '\n' {
                out.push(' ');
                last = ' ';
            }
        } else {
            out.push(c);
            last = c;
        }
    }
    out
}

fn is_collapsible(c: char) -> bool {
    matches!(c, ' ' | '\n')
}
