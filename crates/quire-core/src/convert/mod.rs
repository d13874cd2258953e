//! HTML to styled-text conversion.
//!
//! The converter is an [`HtmlHandler`]: it consumes the parser adapter's
//! event stream and builds a [`StyledBuffer`] by opening and closing spans.
//!
//! Three things make it more than a lookup table:
//! - unknown tags switch into a capture mode that records raw markup until
//!   the unknown element closes, then anchors it as one opaque span. The
//!   children of `<video>`/`<audio>` are captured the same way and kept on
//!   the media span.
//! - whitespace collapses across chunk boundaries, except inside `pre`/`code`
//! - plugins get first refusal on tags, text matches and comments

mod state;
#[cfg(test)]
mod tests;

use smol_str::SmolStr;
use state::{Captured, RawCapture, WhitespaceState, collapse_whitespace};

use crate::attributes::Attributes;
use crate::buffer::StyledBuffer;
use crate::color::{format_color, parse_color};
use crate::config::ConverterConfig;
use crate::error::Result;
use crate::media::{MediaLoader, MediaRequest};
use crate::parser::{HtmlHandler, HtmlParser, Nesting};
use crate::plugins::{PluginSet, TagEvent};
use crate::span::{CommentKind, MAGIC_CHAR, OBJECT_CHAR, SpanId, SpanKind};
use crate::style::{style_alignment, style_color};
use crate::tags::{self, TagBehavior};

const COMMENT_TAG: &str = "!--";

/// Reusable HTML to styled-text converter.
pub struct Converter<'a> {
    config: &'a ConverterConfig,
    plugins: &'a PluginSet,
    media: Option<&'a dyn MediaLoader>,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a ConverterConfig, plugins: &'a PluginSet) -> Self {
        Self {
            config,
            plugins,
            media: None,
        }
    }

    /// Send load requests for media tags to `loader`.
    pub fn with_media_loader(mut self, loader: &'a dyn MediaLoader) -> Self {
        self.media = Some(loader);
        self
    }

    /// Convert a complete HTML fragment.
    pub fn convert(&self, source: &str) -> Result<StyledBuffer> {
        let html = self.plugins.preprocess(source);

        let mut state = ConvertState {
            config: self.config,
            plugins: self.plugins,
            media: self.media,
            buffer: StyledBuffer::new(),
            capture: RawCapture::default(),
            whitespace: WhitespaceState::default(),
        };
        HtmlParser::new(self.config).parse(&html, &mut state)?;
        Ok(state.finish())
    }
}

/// Convert `source` with the given configuration and plugins.
pub fn from_html(
    source: &str,
    config: &ConverterConfig,
    plugins: &PluginSet,
) -> Result<StyledBuffer> {
    Converter::new(config, plugins).convert(source)
}

struct ConvertState<'a> {
    config: &'a ConverterConfig,
    plugins: &'a PluginSet,
    media: Option<&'a dyn MediaLoader>,
    buffer: StyledBuffer,
    capture: RawCapture,
    whitespace: WhitespaceState,
}

impl ConvertState<'_> {
    fn offer_tag(&mut self, opening: bool, name: &str, attrs: &Attributes, nesting: usize) -> bool {
        let event = TagEvent {
            opening,
            tag: name,
            attrs,
            nesting,
            config: self.config,
        };
        let plugins = self.plugins;
        plugins
            .tag_handlers()
            .filter(|handler| handler.can_handle_tag(name))
            .any(|handler| handler.handle_tag(event, &mut self.buffer))
    }

    fn place_cursor(&mut self, name: &str, at: usize, nesting: usize) {
        self.buffer
            .attach(SpanKind::Cursor, name, Attributes::new(), at..at, nesting);
    }

    fn insert_placeholder(
        &mut self,
        placeholder: char,
        kind: SpanKind,
        name: &str,
        attrs: Attributes,
        nesting: usize,
    ) -> SpanId {
        let start = self.buffer.len();
        self.buffer.push_char(placeholder);
        let end = self.buffer.len();
        self.buffer.attach(kind, name, attrs, start..end, nesting)
    }

    fn start_media(&mut self, kind: SpanKind, name: &str, attrs: Attributes, nesting: usize) {
        let source = attrs.get("src").map(SmolStr::new);
        let start = self.buffer.len();
        let id = self.insert_placeholder(OBJECT_CHAR, kind.clone(), name, attrs, nesting);
        if !tags::is_void(name) {
            self.capture.begin_media(id, start);
        }

        let (Some(loader), Some(source), SpanKind::Media { kind: media, .. }) =
            (self.media, source, kind)
        else {
            return;
        };
        loader.load(MediaRequest {
            kind: media,
            source,
            span: id,
            max_width: self.config.media_max_width,
            min_width: None,
        });
    }

    fn start_rule(&mut self, name: &str, attrs: Attributes, nesting: usize) {
        self.buffer.push_separator();
        let start = self.buffer.len();
        self.buffer.push_char(MAGIC_CHAR);
        self.buffer.push_separator();
        let end = self.buffer.len();
        self.buffer
            .attach(SpanKind::HorizontalRule, name, attrs, start..end, nesting);
    }

    /// Materialize a finished capture: a placeholder span for unknown
    /// markup, or the children of the media span that started it.
    fn finish_capture(&mut self, name: &str, nesting: usize) {
        match self.capture.finish() {
            Captured::Unknown(raw) => {
                tracing::debug!(tag = name, raw_len = raw.len(), "captured unknown content");
                self.plugins.notify_unknown_html(&raw);
                self.insert_placeholder(
                    OBJECT_CHAR,
                    SpanKind::UnknownHtml(raw),
                    name,
                    Attributes::new(),
                    nesting,
                );
            }
            Captured::MediaChildren { span, raw } => {
                if let Some(SpanKind::Media { children, .. }) =
                    self.buffer.get_mut(span).map(|media| &mut media.kind)
                {
                    *children = raw;
                }
            }
        }
    }

    /// Resolve `color`/`face` on a closed `font` span into derived spans.
    fn resolve_font(&mut self, id: SpanId) {
        let Some(span) = self.buffer.get(id) else {
            return;
        };
        let Some(range) = span.range() else {
            return;
        };
        let nesting = span.nesting;
        let color = span.attrs.get("color").map(str::to_owned);
        let face = span.attrs.get("face").map(str::to_owned);

        if let Some(value) = color {
            match parse_color(&value, &self.config.color_resources) {
                Some(rgb) => {
                    if value.trim_start().starts_with('@') {
                        // Resource references serialize as their resolved value.
                        if let Some(span) = self.buffer.get_mut(id) {
                            span.attrs.set("color", format_color(rgb));
                        }
                    }
                    self.buffer.attach(
                        SpanKind::Color(rgb),
                        "font",
                        Attributes::new(),
                        range.clone(),
                        nesting,
                    );
                }
                None => {
                    tracing::debug!(color = %value, "unparseable font color, dropping attribute");
                    if let Some(span) = self.buffer.get_mut(id) {
                        span.attrs.remove("color");
                    }
                }
            }
        }

        if let Some(face) = face {
            self.buffer.attach(
                SpanKind::Typeface(face.into()),
                "font",
                Attributes::new(),
                range,
                nesting,
            );
        }
    }

    /// Resolve `color` and `text-align` from a closed span's `style`
    /// attribute into derived spans.
    fn resolve_style(&mut self, id: SpanId) {
        let Some(span) = self.buffer.get(id) else {
            return;
        };
        let (Some(style), Some(range)) = (span.attrs.get("style"), span.range()) else {
            return;
        };
        if range.is_empty() {
            return;
        }
        let color = style_color(style, &self.config.color_resources);
        let alignment = style_alignment(style).filter(|_| span.kind.is_block());
        let (tag, nesting) = (span.tag.clone(), span.nesting);

        if let Some(rgb) = color {
            self.buffer.attach(
                SpanKind::Color(rgb),
                tag.clone(),
                Attributes::new(),
                range.clone(),
                nesting,
            );
        }
        if let Some(alignment) = alignment {
            self.buffer.attach(
                SpanKind::Alignment(alignment),
                tag,
                Attributes::new(),
                range,
                nesting,
            );
        }
    }

    /// Append text, giving text-handler plugins first pick of their matches.
    fn insert_text(&mut self, text: &str, nesting: usize) {
        let plugins = self.plugins;
        let mut rest = text;
        loop {
            let earliest = plugins
                .text_handlers()
                .filter_map(|handler| {
                    handler
                        .pattern()
                        .find_iter(rest)
                        .find(|m| !m.is_empty())
                        .map(|m| (handler, m))
                })
                .min_by_key(|(_, m)| m.start());

            let Some((handler, m)) = earliest else {
                self.append_text(rest);
                return;
            };

            self.append_text(&rest[..m.start()]);
            if !handler.on_match(m.as_str(), &mut self.buffer, nesting) {
                self.append_text(m.as_str());
            }
            rest = &rest[m.end()..];
        }
    }

    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.whitespace.preserves() || !self.config.collapse_whitespace {
            self.buffer.push_str(text);
        } else {
            let collapsed = collapse_whitespace(text, self.buffer.last_char());
            self.buffer.push_str(&collapsed);
        }
    }

    fn insert_comment(&mut self, text: &str, nesting: usize) {
        let body = text.trim();
        let kind = if body.eq_ignore_ascii_case(&self.config.more_comment) {
            CommentKind::More
        } else if body.eq_ignore_ascii_case(&self.config.page_comment) {
            CommentKind::PageBreak
        } else {
            CommentKind::Plain
        };

        if kind == CommentKind::Plain {
            let start = self.buffer.len();
            self.buffer.push_str(text);
            let end = self.buffer.len();
            self.buffer.attach(
                SpanKind::Comment(kind),
                COMMENT_TAG,
                Attributes::new(),
                start..end,
                nesting,
            );
        } else {
            self.insert_placeholder(
                MAGIC_CHAR,
                SpanKind::Comment(kind),
                COMMENT_TAG,
                Attributes::new(),
                nesting,
            );
        }
    }

    /// Finalize pass: flush a capture cut short by the end of input, close
    /// anything left open, trim one trailing blank line off paragraph-level
    /// spans, then run span postprocessors.
    fn finish(mut self) -> StyledBuffer {
        if self.capture.is_active() {
            self.finish_capture("", 0);
        }

        let dangling = self.buffer.close_all();
        if dangling > 0 {
            tracing::debug!(dangling, "closed spans left open at end of input");
        }

        let paragraphs: Vec<(SpanId, usize, usize)> = self
            .buffer
            .closed_spans()
            .filter(|(_, span)| span.kind.is_paragraph_style())
            .filter_map(|(id, span)| span.end.map(|end| (id, span.start, end)))
            .collect();
        for (id, start, end) in paragraphs {
            let blank_line = end > start
                && end >= 2
                && self.buffer.char_at(end - 1) == Some('\n')
                && self.buffer.char_at(end - 2) == Some('\n');
            if !blank_line {
                continue;
            }
            if end - 1 == start {
                tracing::debug!(span = id.index(), "dropping blank paragraph span");
                self.buffer.remove(id);
            } else if let Some(span) = self.buffer.get_mut(id) {
                span.end = Some(end - 1);
            }
        }

        let plugins = self.plugins;
        for postprocessor in plugins.span_postprocessors() {
            postprocessor.after_spans_processed(&mut self.buffer);
        }

        tracing::debug!(
            chars = self.buffer.len(),
            spans = self.buffer.spans().count(),
            "conversion finished"
        );
        self.buffer
    }
}

impl HtmlHandler for ConvertState<'_> {
    fn start_tag(&mut self, name: &str, attrs: Attributes, nesting: usize) {
        tracing::trace!(target: "quire::convert", tag = name, nesting, "start tag");

        if self.capture.is_active() {
            if self.config.is_cursor(name) {
                let anchor = self.capture.anchor();
                self.place_cursor(name, anchor, nesting);
            } else {
                self.capture
                    .push_start_tag(name, &attrs, !tags::is_void(name));
            }
            return;
        }

        if self.config.is_cursor(name) {
            let at = self.buffer.len();
            self.place_cursor(name, at, nesting);
            return;
        }

        if self.offer_tag(true, name, &attrs, nesting) {
            return;
        }

        if !tags::is_known(name) {
            let anchor = self.buffer.len();
            self.capture.begin(name, &attrs, anchor);
            if tags::is_void(name) {
                self.finish_capture(name, nesting);
            }
            return;
        }

        match tags::behavior(name) {
            Some(TagBehavior::LineBreak) => self.buffer.push_char('\n'),
            Some(TagBehavior::PreserveWhitespace) => self.whitespace.enter(),
            None => {}
        }

        match tags::span_kind(name) {
            Some(kind @ SpanKind::Media { .. }) => self.start_media(kind, name, attrs, nesting),
            Some(SpanKind::HorizontalRule) => self.start_rule(name, attrs, nesting),
            Some(kind) if kind.is_block() => {
                self.buffer.open_block(kind, name, attrs, nesting);
            }
            Some(kind) => {
                self.buffer.open(kind, name, attrs, nesting);
            }
            None => {}
        }
    }

    fn end_tag(&mut self, name: &str, nesting: usize) {
        tracing::trace!(target: "quire::convert", tag = name, nesting, "end tag");

        if self.capture.is_active() {
            // Cursor markers and void elements never nest, so their end
            // events leave the capture depth alone.
            if self.config.is_cursor(name) || tags::is_void(name) {
                return;
            }
            if self.capture.push_end_tag(name) {
                self.finish_capture(name, nesting);
            }
            return;
        }

        if self.config.is_cursor(name) {
            return;
        }

        if self.offer_tag(false, name, &Attributes::new(), nesting) {
            return;
        }

        if tags::behavior(name) == Some(TagBehavior::PreserveWhitespace) {
            self.whitespace.exit();
        }

        let Some(kind) = tags::span_kind(name) else {
            return;
        };
        let closed = match kind {
            SpanKind::Media { .. } | SpanKind::HorizontalRule => return,
            ref block if block.is_block() => self.buffer.close_block(&kind),
            _ => self.buffer.close(&kind),
        };
        match closed {
            Ok(Some(id)) => {
                if kind == SpanKind::Font {
                    self.resolve_font(id);
                }
                self.resolve_style(id);
            }
            Ok(None) => {}
            Err(err) => tracing::debug!(tag = name, error = %err, "close failed"),
        }
    }

    fn text(&mut self, text: &str, nesting: usize) {
        tracing::trace!(target: "quire::convert", len = text.len(), nesting, "text");

        if self.capture.is_active() {
            self.capture.push_text(text);
            return;
        }
        self.insert_text(text, nesting);
    }

    fn comment(&mut self, text: &str, nesting: &mut Nesting) {
        tracing::trace!(target: "quire::convert", nesting = nesting.level(), "comment");

        if self.capture.is_active() {
            self.capture.push_comment(text);
            return;
        }

        let plugins = self.plugins;
        let handled = plugins
            .comment_handlers()
            .any(|handler| handler.handle_comment(text, &mut self.buffer, nesting));
        if !handled {
            self.insert_comment(text, nesting.level());
        }
    }
}
