//! Caption shortcode: `[caption ...]<img ...> text[/caption]`.
//!
//! The shortcode is rewritten into a private element before parsing so its
//! content converts like any other markup. A tag handler turns that element
//! into one single-line caption span, and after serialization the element is
//! folded back into the shortcode.

use std::sync::LazyLock;

use regex::Regex;

use crate::attributes::Attributes;
use crate::buffer::StyledBuffer;
use crate::span::{Alignment, SpanKind, ZERO_WIDTH_CHAR};

use super::shortcode::replace_unescaped;
use super::{HtmlPostprocessor, HtmlPreprocessor, TagEvent, TagHandler};

/// Element name standing in for the shortcode between the two passes.
pub const CAPTION_TAG: &str = "wp-shortcode-caption-html-tag";

static SHORTCODE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[caption([^\]]*)\]").unwrap());
static SHORTCODE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[/caption\]").unwrap());
static TAG_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("<{CAPTION_TAG}([^>]*)>")).unwrap());
static TAG_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("</{CAPTION_TAG}>")).unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionShortcode;

fn alignment(value: &str) -> Option<Alignment> {
    match value {
        "alignleft" => Some(Alignment::Left),
        "aligncenter" => Some(Alignment::Center),
        "alignright" => Some(Alignment::Right),
        _ => None,
    }
}

/// Make the caption content one line: trailing newlines go, inner ones
/// become spaces.
fn flatten_lines(buffer: &mut StyledBuffer, start: usize) {
    while buffer.len() > start && buffer.last_char() == Some('\n') {
        let end = buffer.len();
        buffer.delete_range(end - 1..end);
    }
    let newlines: Vec<usize> = (start..buffer.len())
        .filter(|at| buffer.char_at(*at) == Some('\n'))
        .collect();
    for at in newlines {
        buffer.delete_range(at..at + 1);
        buffer.insert_text(at, " ");
    }
}

impl HtmlPreprocessor for CaptionShortcode {
    fn before_html_processed(&self, source: &str) -> String {
        let html = replace_unescaped(source, &SHORTCODE_OPEN, |caps| {
            format!("<{CAPTION_TAG}{}>", &caps[1])
        });
        replace_unescaped(&html, &SHORTCODE_CLOSE, |_| format!("</{CAPTION_TAG}>"))
    }
}

impl TagHandler for CaptionShortcode {
    fn can_handle_tag(&self, tag: &str) -> bool {
        tag == CAPTION_TAG
    }

    fn handle_tag(&self, event: TagEvent<'_>, buffer: &mut StyledBuffer) -> bool {
        if event.opening {
            buffer.open(
                SpanKind::Caption,
                event.tag,
                event.attrs.clone(),
                event.nesting,
            );
            return true;
        }

        let Some(start) = buffer.peek_open(&SpanKind::Caption).map(|span| span.start) else {
            return true;
        };
        flatten_lines(buffer, start);
        if buffer.len() == start {
            buffer.push_char(ZERO_WIDTH_CHAR);
        }

        match buffer.close(&SpanKind::Caption) {
            Ok(Some(id)) => {
                let Some(span) = buffer.get(id) else {
                    return true;
                };
                let align = span.attrs.get("align").and_then(alignment);
                let (range, nesting) = (span.range(), span.nesting);
                if let (Some(align), Some(range)) = (align, range) {
                    buffer.attach(
                        SpanKind::Alignment(align),
                        CAPTION_TAG,
                        Attributes::new(),
                        range,
                        nesting,
                    );
                }
            }
            Ok(None) => {}
            Err(err) => tracing::debug!(error = %err, "failed to close caption"),
        }
        true
    }
}

impl HtmlPostprocessor for CaptionShortcode {
    fn on_html_processed(&self, html: &str) -> String {
        let html = TAG_OPEN.replace_all(html, "[caption$1]");
        TAG_CLOSE.replace_all(&html, "[/caption]").into_owned()
    }
}
