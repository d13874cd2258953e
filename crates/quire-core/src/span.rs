//! Span model: the formatting annotations anchored over the styled buffer.
//!
//! A span is one formatting concept (bold, a heading, a link, an opaque chunk
//! of unknown markup) over a char range. Spans are created open, with only a
//! start offset, and get their end exactly once when closed.

use std::mem::Discriminant;
use std::ops::Range;

use serde::Serialize;
use smol_str::SmolStr;

use crate::attributes::Attributes;

/// Placeholder anchoring unknown content and media.
pub const OBJECT_CHAR: char = '\u{FFFC}';
/// Placeholder anchoring horizontal rules and pagination markers.
pub const MAGIC_CHAR: char = '\u{FEFF}';
/// Filler keeping an otherwise empty block alive. Never serialized.
pub const ZERO_WIDTH_CHAR: char = '\u{200B}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommentKind {
    /// Ordinary comment, shown as text.
    Plain,
    /// Continuation marker (`<!--more-->`).
    More,
    /// Page break marker (`<!--nextpage-->`).
    PageBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    /// `text-align` values. Anything unrecognized aligns left.
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "right" => Self::Right,
            "center" => Self::Center,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// The formatting concept a span represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SpanKind {
    // Inline character styles.
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Monospace,
    Big,
    Small,
    Code,
    Link,
    Font,
    /// `<span>` kept only to round-trip its attributes.
    HiddenInline,
    /// Caption shortcode content, an image followed by its caption text.
    Caption,

    // Resolved from `font` attributes or inline styles. Display-only, never
    // serialized.
    Color(u32),
    Typeface(SmolStr),
    Alignment(Alignment),

    // Paragraph-level styles.
    Heading(u8),
    List(ListKind),
    ListItem,
    Paragraph,
    Preformat,
    Blockquote,
    /// `<div>` kept only to round-trip its attributes.
    HiddenBlock,
    HorizontalRule,
    /// Block delimited by an opening and closing comment pair.
    CommentBlock {
        opening: String,
        closing: Option<String>,
    },

    // Placeholder-anchored content.
    Comment(CommentKind),
    /// Comment whose text is hidden behind a marker char.
    HiddenComment(String),
    UnknownHtml(String),
    /// `children` is the raw markup inside `<video>`/`<audio>`, such as
    /// `<source>` elements and fallback text.
    Media { kind: MediaKind, children: String },

    /// Zero-length caret position marker.
    Cursor,
}

impl SpanKind {
    /// Key used for per-kind open stacks. Payloads are ignored, so `</h3>`
    /// closes whichever heading was opened most recently.
    pub fn key(&self) -> Discriminant<SpanKind> {
        std::mem::discriminant(self)
    }

    /// Structural, line-oriented kinds.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            SpanKind::Heading(_)
                | SpanKind::List(_)
                | SpanKind::ListItem
                | SpanKind::Paragraph
                | SpanKind::Preformat
                | SpanKind::Blockquote
                | SpanKind::HiddenBlock
                | SpanKind::HorizontalRule
                | SpanKind::CommentBlock { .. }
        )
    }

    /// Kinds whose range is rendered from the span itself rather than from
    /// the text it covers. Editing never grows them.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            SpanKind::Comment(_)
                | SpanKind::HiddenComment(_)
                | SpanKind::UnknownHtml(_)
                | SpanKind::Media { .. }
                | SpanKind::HorizontalRule
        )
    }

    /// Kinds computed from another span and skipped on serialization.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            SpanKind::Color(_) | SpanKind::Typeface(_) | SpanKind::Alignment(_)
        )
    }

    /// Whether text inside this kind keeps its whitespace verbatim.
    pub fn preserves_whitespace(&self) -> bool {
        matches!(self, SpanKind::Preformat | SpanKind::Code)
    }

    /// Paragraph-level spans that take part in the finalize trim.
    pub fn is_paragraph_style(&self) -> bool {
        self.is_block() && !self.is_atomic()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpanKind::Bold => "bold",
            SpanKind::Italic => "italic",
            SpanKind::Underline => "underline",
            SpanKind::Strikethrough => "strikethrough",
            SpanKind::Superscript => "superscript",
            SpanKind::Subscript => "subscript",
            SpanKind::Monospace => "monospace",
            SpanKind::Big => "big",
            SpanKind::Small => "small",
            SpanKind::Code => "code",
            SpanKind::Link => "link",
            SpanKind::Font => "font",
            SpanKind::HiddenInline => "hidden-inline",
            SpanKind::Caption => "caption",
            SpanKind::Color(_) => "color",
            SpanKind::Typeface(_) => "typeface",
            SpanKind::Alignment(_) => "alignment",
            SpanKind::Heading(_) => "heading",
            SpanKind::List(_) => "list",
            SpanKind::ListItem => "list-item",
            SpanKind::Paragraph => "paragraph",
            SpanKind::Preformat => "preformat",
            SpanKind::Blockquote => "blockquote",
            SpanKind::HiddenBlock => "hidden-block",
            SpanKind::HorizontalRule => "horizontal-rule",
            SpanKind::CommentBlock { .. } => "comment-block",
            SpanKind::Comment(_) => "comment",
            SpanKind::HiddenComment(_) => "hidden-comment",
            SpanKind::UnknownHtml(_) => "unknown-html",
            SpanKind::Media { .. } => "media",
            SpanKind::Cursor => "cursor",
        }
    }
}

/// Handle to a span in a [`StyledBuffer`](crate::buffer::StyledBuffer) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpanId(pub(crate) usize);

impl SpanId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A formatting annotation over a char range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub kind: SpanKind,
    /// Tag name the span was created from (`b` vs `strong`, `del` vs `s`).
    pub tag: SmolStr,
    pub attrs: Attributes,
    pub start: usize,
    /// Unset while the span is open.
    pub end: Option<usize>,
    /// Creation order, monotonically increasing per buffer.
    pub seq: u64,
    /// Nesting level of the tag that created the span.
    pub nesting: usize,
}

impl Span {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Closed range, or None while open.
    pub fn range(&self) -> Option<Range<usize>> {
        self.end.map(|end| self.start..end)
    }

    pub fn is_empty(&self) -> bool {
        self.end == Some(self.start)
    }

    pub fn href(&self) -> Option<&str> {
        self.attrs.get("href")
    }

    /// Tags that have no closing counterpart.
    pub fn is_void(&self) -> bool {
        matches!(self.tag.as_str(), "img" | "hr" | "br")
    }

    /// Render `<tag attrs>`.
    pub fn opening_tag(&self) -> String {
        format!("<{}{}>", self.tag, self.attrs.serialize())
    }

    /// Render `</tag>`, or nothing for void tags.
    pub fn closing_tag(&self) -> String {
        if self.is_void() {
            String::new()
        } else {
            format!("</{}>", self.tag)
        }
    }
}
