//! Tag dispatch tables.
//!
//! Canonical lowercase tag name to span kind, plus the behavior-only tags
//! that affect conversion without producing a span of their own.

use crate::span::{ListKind, MediaKind, SpanKind};

/// Conversion behavior attached to a tag besides its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagBehavior {
    /// Emits a newline and nothing else.
    LineBreak,
    /// Suppresses whitespace collapsing until the matching close.
    PreserveWhitespace,
}

/// Span kind created by a known tag.
pub fn span_kind(tag: &str) -> Option<SpanKind> {
    let kind = match tag {
        "b" | "strong" => SpanKind::Bold,
        "i" | "em" | "cite" | "dfn" => SpanKind::Italic,
        "u" => SpanKind::Underline,
        "s" | "strike" | "del" => SpanKind::Strikethrough,
        "sup" => SpanKind::Superscript,
        "sub" => SpanKind::Subscript,
        "tt" => SpanKind::Monospace,
        "big" => SpanKind::Big,
        "small" => SpanKind::Small,
        "code" => SpanKind::Code,
        "a" => SpanKind::Link,
        "font" => SpanKind::Font,
        "span" => SpanKind::HiddenInline,
        "h1" => SpanKind::Heading(1),
        "h2" => SpanKind::Heading(2),
        "h3" => SpanKind::Heading(3),
        "h4" => SpanKind::Heading(4),
        "h5" => SpanKind::Heading(5),
        "h6" => SpanKind::Heading(6),
        "ul" => SpanKind::List(ListKind::Unordered),
        "ol" => SpanKind::List(ListKind::Ordered),
        "li" => SpanKind::ListItem,
        "p" => SpanKind::Paragraph,
        "pre" => SpanKind::Preformat,
        "blockquote" => SpanKind::Blockquote,
        "div" => SpanKind::HiddenBlock,
        "hr" => SpanKind::HorizontalRule,
        "img" => media(MediaKind::Image),
        "video" => media(MediaKind::Video),
        "audio" => media(MediaKind::Audio),
        _ => return None,
    };
    Some(kind)
}

fn media(kind: MediaKind) -> SpanKind {
    SpanKind::Media {
        kind,
        children: String::new(),
    }
}

/// Behavior of a tag independent of any span it creates.
pub fn behavior(tag: &str) -> Option<TagBehavior> {
    match tag {
        "br" => Some(TagBehavior::LineBreak),
        "pre" | "code" => Some(TagBehavior::PreserveWhitespace),
        _ => None,
    }
}

/// Whether the converter interprets `tag`. Anything else is unknown content.
pub fn is_known(tag: &str) -> bool {
    span_kind(tag).is_some() || behavior(tag).is_some()
}

/// HTML void elements. They never have content or a closing tag.
pub fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}
