//! Media shortcodes: `[audio ...]` and `[video ...]`.
//!
//! Before parsing, a bracketed shortcode becomes an empty media element so
//! the converter sees ordinary media. After serialization the media tag is
//! folded back into its shortcode.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{HtmlPostprocessor, HtmlPreprocessor};

const GUTENBERG_BLOCK_START: &str = "<!-- wp:";

static AUDIO: LazyLock<Patterns> = LazyLock::new(|| Patterns::for_tag("audio"));
static VIDEO: LazyLock<Patterns> = LazyLock::new(|| Patterns::for_tag("video"));

#[derive(Debug)]
struct Patterns {
    shortcode: Regex,
    self_closing: Regex,
    paired: Regex,
}

impl Patterns {
    fn for_tag(tag: &str) -> Self {
        Self {
            shortcode: Regex::new(&format!(r"\[{tag}([^\]]*)\]")).unwrap(),
            self_closing: Regex::new(&format!(r"<{tag}([^>]*?) */>")).unwrap(),
            paired: Regex::new(&format!(r"<{tag}([^>]*?) *></{tag}>")).unwrap(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Shortcode {
    tag: &'static str,
    /// Leave block-editor content alone.
    skip_gutenberg: bool,
    patterns: &'static Patterns,
}

impl Shortcode {
    pub fn audio() -> Self {
        Self {
            tag: "audio",
            skip_gutenberg: true,
            patterns: &AUDIO,
        }
    }

    pub fn video() -> Self {
        Self {
            tag: "video",
            skip_gutenberg: false,
            patterns: &VIDEO,
        }
    }

    fn in_gutenberg_mode(&self, source: &str) -> bool {
        self.skip_gutenberg && source.contains(GUTENBERG_BLOCK_START)
    }
}

/// Replace every match of `pattern` that is not escaped by doubled brackets
/// (`[[audio]]` stays literal).
pub(super) fn replace_unescaped(
    source: &str,
    pattern: &Regex,
    replace: impl Fn(&Captures) -> String,
) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for caps in pattern.captures_iter(source) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        let escaped_before = source[..m.start()].ends_with('[');
        let escaped_after = source[m.end()..].starts_with(']');
        if escaped_before || escaped_after {
            continue;
        }
        out.push_str(&source[last..m.start()]);
        out.push_str(&replace(&caps));
        last = m.end();
    }
    out.push_str(&source[last..]);
    out
}

impl HtmlPreprocessor for Shortcode {
    fn before_html_processed(&self, source: &str) -> String {
        if self.in_gutenberg_mode(source) {
            return source.to_string();
        }
        let tag = self.tag;
        replace_unescaped(source, &self.patterns.shortcode, |caps| {
            format!("<{tag}{}></{tag}>", &caps[1])
        })
    }
}

impl HtmlPostprocessor for Shortcode {
    fn on_html_processed(&self, html: &str) -> String {
        if self.in_gutenberg_mode(html) {
            // Both tags are mandatory for media elements in block content.
            let tag = self.tag;
            return self
                .patterns
                .self_closing
                .replace_all(html, |caps: &Captures| format!("<{tag}{}></{tag}>", &caps[1]))
                .into_owned();
        }

        let tag = self.tag;
        let fold = |caps: &Captures| format!("[{tag}{}]", &caps[1]);
        let html = self.patterns.self_closing.replace_all(html, fold);
        self.patterns.paired.replace_all(&html, fold).into_owned()
    }
}
