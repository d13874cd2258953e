//! A minimal editing surface over a [`StyledBuffer`].
//!
//! The `EditorAction` enum represents semantic editing operations. Hosts
//! translate their input events into actions and hand them to
//! [`execute_action`], which mutates the buffer and selection.

use crate::attributes::Attributes;
use crate::buffer::StyledBuffer;
use crate::config::{ConverterConfig, SerializeOptions};
use crate::convert::from_html;
use crate::error::Result;
use crate::plugins::PluginSet;
use crate::serialize::to_html;
use crate::span::{ListKind, SpanKind};

/// A range in the buffer, measured in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self::new(self.end, self.start)
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

/// Character-level styles the editor can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl InlineStyle {
    fn kind(self) -> (SpanKind, &'static str) {
        match self {
            Self::Bold => (SpanKind::Bold, "b"),
            Self::Italic => (SpanKind::Italic, "i"),
            Self::Underline => (SpanKind::Underline, "u"),
            Self::Strikethrough => (SpanKind::Strikethrough, "del"),
            Self::Code => (SpanKind::Code, "code"),
        }
    }
}

/// Paragraph-level styles the editor can apply to the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Paragraph,
    Heading(u8),
    UnorderedList,
    OrderedList,
    Quote,
    Preformat,
}

impl BlockStyle {
    fn kind(self) -> (SpanKind, &'static str) {
        match self {
            Self::Paragraph => (SpanKind::Paragraph, "p"),
            Self::Heading(level) => {
                let level = level.clamp(1, 6);
                let tag = ["h1", "h2", "h3", "h4", "h5", "h6"][usize::from(level - 1)];
                (SpanKind::Heading(level), tag)
            }
            Self::UnorderedList => (SpanKind::List(ListKind::Unordered), "ul"),
            Self::OrderedList => (SpanKind::List(ListKind::Ordered), "ol"),
            Self::Quote => (SpanKind::Blockquote, "blockquote"),
            Self::Preformat => (SpanKind::Preformat, "pre"),
        }
    }

    fn is_list(self) -> bool {
        matches!(self, Self::UnorderedList | Self::OrderedList)
    }
}

/// Semantic editing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Replace the selection with text.
    Insert { text: String },
    /// Delete the selection, or the character before the caret.
    DeleteBackward,
    ToggleInline(InlineStyle),
    ApplyBlock(BlockStyle),
    SetSelection(Range),
    SelectAll,
}

/// A styled buffer plus a selection.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    buffer: StyledBuffer,
    selection: Range,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing content with the caret at the end.
    pub fn from_buffer(buffer: StyledBuffer) -> Self {
        let end = buffer.len();
        Self {
            buffer,
            selection: Range::caret(end),
        }
    }

    pub fn from_html(source: &str, config: &ConverterConfig, plugins: &PluginSet) -> Result<Self> {
        Ok(Self::from_buffer(from_html(source, config, plugins)?))
    }

    pub fn buffer(&self) -> &StyledBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> StyledBuffer {
        self.buffer
    }

    pub fn selection(&self) -> Range {
        self.selection
    }

    pub fn to_html(&self, options: &SerializeOptions, plugins: &PluginSet) -> String {
        to_html(&self.buffer, options, plugins)
    }

    fn clamp(&self, range: Range) -> Range {
        let len = self.buffer.len();
        let range = range.normalize();
        Range::new(range.start.min(len), range.end.min(len))
    }
}

/// Execute an action. Returns whether the buffer or selection changed.
pub fn execute_action(editor: &mut Editor, action: &EditorAction) -> bool {
    match action {
        EditorAction::Insert { text } => execute_insert(editor, text),
        EditorAction::DeleteBackward => execute_delete_backward(editor),
        EditorAction::ToggleInline(style) => execute_toggle_inline(editor, *style),
        EditorAction::ApplyBlock(style) => execute_apply_block(editor, *style),
        EditorAction::SetSelection(range) => {
            let range = editor.clamp(*range);
            let changed = range != editor.selection;
            editor.selection = range;
            changed
        }
        EditorAction::SelectAll => {
            let range = Range::new(0, editor.buffer.len());
            let changed = range != editor.selection;
            editor.selection = range;
            changed
        }
    }
}

fn execute_insert(editor: &mut Editor, text: &str) -> bool {
    let range = editor.clamp(editor.selection);
    if !range.is_caret() {
        editor.buffer.delete_range(range.into());
    }
    if text.is_empty() {
        editor.selection = Range::caret(range.start);
        return !range.is_caret();
    }
    editor.buffer.insert_text(range.start, text);
    editor.selection = Range::caret(range.start + text.chars().count());
    true
}

fn execute_delete_backward(editor: &mut Editor) -> bool {
    let range = editor.clamp(editor.selection);
    let range = if range.is_caret() {
        if range.start == 0 {
            return false;
        }
        Range::new(range.start - 1, range.start)
    } else {
        range
    };
    editor.buffer.delete_range(range.into());
    editor.selection = Range::caret(range.start);
    true
}

fn execute_toggle_inline(editor: &mut Editor, style: InlineStyle) -> bool {
    let (kind, tag) = style.kind();
    let range = editor.clamp(editor.selection);
    let key = kind.key();

    let overlapping: Vec<_> = editor
        .buffer
        .closed_spans()
        .filter(|(_, span)| span.kind.key() == key)
        .filter_map(|(id, span)| span.range().map(|r| (id, r)))
        .filter(|(_, r)| r.start <= range.start && range.end <= r.end)
        .collect();

    if overlapping.is_empty() {
        // At a caret this is an empty span that typed text grows into.
        editor
            .buffer
            .attach(kind, tag, Attributes::new(), range.into(), 0);
        return true;
    }

    for (id, covered) in overlapping {
        let Some(span) = editor.buffer.remove(id) else {
            continue;
        };
        for piece in [covered.start..range.start, range.end..covered.end] {
            if !piece.is_empty() {
                editor.buffer.attach(
                    span.kind.clone(),
                    span.tag.clone(),
                    span.attrs.clone(),
                    piece,
                    span.nesting,
                );
            }
        }
    }
    true
}

fn execute_apply_block(editor: &mut Editor, style: BlockStyle) -> bool {
    let (kind, tag) = style.kind();
    let caret = editor.clamp(editor.selection);
    let start = editor.buffer.text().line_start(caret.start);
    let end = editor.buffer.text().line_end(caret.end);

    // Applying the style the line already has removes it.
    let existing: Vec<_> = editor
        .buffer
        .closed_spans()
        .filter(|(_, span)| {
            span.kind == kind || (style.is_list() && span.kind == SpanKind::ListItem)
        })
        .filter(|(_, span)| span.start <= start && span.end.is_some_and(|e| e >= end))
        .map(|(id, _)| id)
        .collect();
    if existing
        .iter()
        .any(|id| editor.buffer.get(*id).is_some_and(|span| span.kind == kind))
    {
        for id in existing {
            editor.buffer.remove(id);
        }
        return true;
    }

    editor
        .buffer
        .attach(kind, tag, Attributes::new(), start..end, 1);
    if style.is_list() {
        editor
            .buffer
            .attach(SpanKind::ListItem, "li", Attributes::new(), start..end, 2);
    }
    true
}
