//! Conversion configuration.
//!
//! A `ConverterConfig` is built once by the host and passed by reference into
//! every conversion. Nothing about the markup schema is global.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Default name of the cursor pseudo-tag.
pub const DEFAULT_CURSOR_TAG: &str = "quire_cursor";

/// Settings for HTML to styled-text conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Tags whose start and end events are dropped entirely.
    pub ignored_tags: BTreeSet<SmolStr>,
    /// Pseudo-tag marking the caret position.
    pub cursor_tag: SmolStr,
    /// Collapse whitespace runs outside `pre`/`code`.
    pub collapse_whitespace: bool,
    /// Comment body marking a continuation break.
    pub more_comment: SmolStr,
    /// Comment body marking a page break.
    pub page_comment: SmolStr,
    /// Host color table for `@name` references.
    pub color_resources: BTreeMap<SmolStr, u32>,
    /// Width limit passed along with media load requests.
    pub media_max_width: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ignored_tags: ["html", "body"].into_iter().map(SmolStr::new).collect(),
            cursor_tag: SmolStr::new_static(DEFAULT_CURSOR_TAG),
            collapse_whitespace: true,
            more_comment: SmolStr::new_static("more"),
            page_comment: SmolStr::new_static("nextpage"),
            color_resources: BTreeMap::new(),
            media_max_width: 800,
        }
    }
}

impl ConverterConfig {
    pub fn is_ignored(&self, tag: &str) -> bool {
        self.ignored_tags.contains(tag)
    }

    pub fn is_cursor(&self, tag: &str) -> bool {
        self.cursor_tag == tag
    }

    pub fn with_ignored_tag(mut self, tag: impl Into<SmolStr>) -> Self {
        self.ignored_tags.insert(tag.into());
        self
    }

    pub fn with_color_resource(mut self, name: impl Into<SmolStr>, color: u32) -> Self {
        self.color_resources.insert(name.into(), color);
        self
    }
}

/// Settings for styled-text to HTML serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Emit cursor markers as `<cursor_tag></cursor_tag>`.
    pub with_cursor: bool,
    /// Pretty-print block structure for a source view.
    pub source_format: bool,
    /// Cursor tag to emit when `with_cursor` is set.
    pub cursor_tag: Option<SmolStr>,
}

impl SerializeOptions {
    pub fn source() -> Self {
        Self {
            source_format: true,
            ..Self::default()
        }
    }

    pub(crate) fn cursor_tag(&self) -> &str {
        self.cursor_tag.as_deref().unwrap_or(DEFAULT_CURSOR_TAG)
    }
}
