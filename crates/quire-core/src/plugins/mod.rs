//! Plugin hook points for conversion and serialization.
//!
//! A [`Plugin`] bundles any subset of capabilities. The converter asks a
//! [`PluginSet`] for the plugins holding a given capability instead of
//! downcasting plugin types.

mod caption;
mod gutenberg;
mod shortcode;

pub use caption::{CAPTION_TAG, CaptionShortcode};
pub use gutenberg::GutenbergComments;
pub use shortcode::Shortcode;

use regex::Regex;
use smol_str::SmolStr;

use crate::attributes::Attributes;
use crate::buffer::StyledBuffer;
use crate::config::ConverterConfig;
use crate::parser::Nesting;

/// Rewrites raw HTML once before parsing.
pub trait HtmlPreprocessor {
    fn before_html_processed(&self, source: &str) -> String;
}

/// A tag event offered to tag handlers before default dispatch.
#[derive(Debug, Clone, Copy)]
pub struct TagEvent<'a> {
    pub opening: bool,
    pub tag: &'a str,
    pub attrs: &'a Attributes,
    pub nesting: usize,
    pub config: &'a ConverterConfig,
}

/// Takes over start and end events for the tags it claims.
pub trait TagHandler {
    fn can_handle_tag(&self, tag: &str) -> bool;

    /// Returns true when the event was fully handled.
    fn handle_tag(&self, event: TagEvent<'_>, buffer: &mut StyledBuffer) -> bool;
}

/// Consumes pattern matches out of text before it reaches the buffer.
pub trait TextHandler {
    fn pattern(&self) -> &Regex;

    /// Returns true when the match was consumed.
    fn on_match(&self, text: &str, buffer: &mut StyledBuffer, nesting: usize) -> bool;
}

/// Takes over comments. May move the nesting level for following events.
pub trait CommentHandler {
    fn handle_comment(&self, text: &str, buffer: &mut StyledBuffer, nesting: &mut Nesting)
    -> bool;
}

/// Adjusts spans once the whole document has been converted.
pub trait SpanPostprocessor {
    fn after_spans_processed(&self, buffer: &mut StyledBuffer);
}

/// Rewrites serialized HTML.
pub trait HtmlPostprocessor {
    fn on_html_processed(&self, html: &str) -> String;
}

/// A named bundle of optional capabilities.
#[derive(Default)]
pub struct Plugin {
    name: SmolStr,
    preprocessor: Option<Box<dyn HtmlPreprocessor>>,
    tag_handler: Option<Box<dyn TagHandler>>,
    text_handler: Option<Box<dyn TextHandler>>,
    comment_handler: Option<Box<dyn CommentHandler>>,
    span_postprocessor: Option<Box<dyn SpanPostprocessor>>,
    html_postprocessor: Option<Box<dyn HtmlPostprocessor>>,
}

impl Plugin {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_preprocessor(mut self, p: impl HtmlPreprocessor + 'static) -> Self {
        self.preprocessor = Some(Box::new(p));
        self
    }

    pub fn with_tag_handler(mut self, h: impl TagHandler + 'static) -> Self {
        self.tag_handler = Some(Box::new(h));
        self
    }

    pub fn with_text_handler(mut self, h: impl TextHandler + 'static) -> Self {
        self.text_handler = Some(Box::new(h));
        self
    }

    pub fn with_comment_handler(mut self, h: impl CommentHandler + 'static) -> Self {
        self.comment_handler = Some(Box::new(h));
        self
    }

    pub fn with_span_postprocessor(mut self, p: impl SpanPostprocessor + 'static) -> Self {
        self.span_postprocessor = Some(Box::new(p));
        self
    }

    pub fn with_html_postprocessor(mut self, p: impl HtmlPostprocessor + 'static) -> Self {
        self.html_postprocessor = Some(Box::new(p));
        self
    }

    pub fn is_preprocessor(&self) -> bool {
        self.preprocessor.is_some()
    }

    pub fn is_tag_handler(&self) -> bool {
        self.tag_handler.is_some()
    }

    pub fn is_text_handler(&self) -> bool {
        self.text_handler.is_some()
    }

    pub fn is_comment_handler(&self) -> bool {
        self.comment_handler.is_some()
    }

    pub fn is_span_postprocessor(&self) -> bool {
        self.span_postprocessor.is_some()
    }

    pub fn is_html_postprocessor(&self) -> bool {
        self.html_postprocessor.is_some()
    }

    /// Audio shortcode support: `[audio src=x]` <-> `<audio src=x></audio>`.
    pub fn audio_shortcode() -> Self {
        let shortcode = Shortcode::audio();
        Plugin::new("audio-shortcode")
            .with_preprocessor(shortcode)
            .with_html_postprocessor(shortcode)
    }

    /// Video shortcode support: `[video src=x]` <-> `<video src=x></video>`.
    pub fn video_shortcode() -> Self {
        let shortcode = Shortcode::video();
        Plugin::new("video-shortcode")
            .with_preprocessor(shortcode)
            .with_html_postprocessor(shortcode)
    }

    /// `[caption]` shortcodes as caption spans over their content.
    pub fn caption_shortcode() -> Self {
        Plugin::new("caption-shortcode")
            .with_preprocessor(CaptionShortcode)
            .with_tag_handler(CaptionShortcode)
            .with_html_postprocessor(CaptionShortcode)
    }

    /// Block editor comment delimiters kept as block spans.
    pub fn gutenberg_comments() -> Self {
        Plugin::new("gutenberg-comments").with_comment_handler(GutenbergComments)
    }

    /// Look up a built-in plugin by the name used in config files.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "audio-shortcode" => Some(Self::audio_shortcode()),
            "video-shortcode" => Some(Self::video_shortcode()),
            "caption-shortcode" => Some(Self::caption_shortcode()),
            "gutenberg-comments" => Some(Self::gutenberg_comments()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("preprocessor", &self.is_preprocessor())
            .field("tag_handler", &self.is_tag_handler())
            .field("text_handler", &self.is_text_handler())
            .field("comment_handler", &self.is_comment_handler())
            .field("span_postprocessor", &self.is_span_postprocessor())
            .field("html_postprocessor", &self.is_html_postprocessor())
            .finish()
    }
}

type UnknownHtmlListener = Box<dyn Fn(&str)>;

/// Ordered plugin list plus the unknown-content listener.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Plugin>,
    on_unknown_html: Option<UnknownHtmlListener>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn push(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    /// Called with the raw markup of every unknown-content span created.
    pub fn on_unknown_html(mut self, listener: impl Fn(&str) + 'static) -> Self {
        self.on_unknown_html = Some(Box::new(listener));
        self
    }

    pub(crate) fn notify_unknown_html(&self, raw: &str) {
        if let Some(listener) = &self.on_unknown_html {
            listener(raw);
        }
    }

    pub fn preprocessors(&self) -> impl Iterator<Item = &dyn HtmlPreprocessor> {
        self.plugins.iter().filter_map(|p| p.preprocessor.as_deref())
    }

    pub fn tag_handlers(&self) -> impl Iterator<Item = &dyn TagHandler> {
        self.plugins.iter().filter_map(|p| p.tag_handler.as_deref())
    }

    pub fn text_handlers(&self) -> impl Iterator<Item = &dyn TextHandler> {
        self.plugins.iter().filter_map(|p| p.text_handler.as_deref())
    }

    pub fn comment_handlers(&self) -> impl Iterator<Item = &dyn CommentHandler> {
        self.plugins.iter().filter_map(|p| p.comment_handler.as_deref())
    }

    pub fn span_postprocessors(&self) -> impl Iterator<Item = &dyn SpanPostprocessor> {
        self.plugins
            .iter()
            .filter_map(|p| p.span_postprocessor.as_deref())
    }

    pub fn html_postprocessors(&self) -> impl Iterator<Item = &dyn HtmlPostprocessor> {
        self.plugins
            .iter()
            .filter_map(|p| p.html_postprocessor.as_deref())
    }

    /// Run every preprocessor over `source` in plugin order.
    pub fn preprocess(&self, source: &str) -> String {
        self.preprocessors()
            .fold(source.to_string(), |html, p| p.before_html_processed(&html))
    }

    /// Run every HTML postprocessor over `html` in plugin order.
    pub fn postprocess(&self, html: String) -> String {
        self.html_postprocessors()
            .fold(html, |html, p| p.on_html_processed(&html))
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("plugins", &self.plugins)
            .field("on_unknown_html", &self.on_unknown_html.is_some())
            .finish()
    }
}
