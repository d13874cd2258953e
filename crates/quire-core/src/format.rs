//! Source-view pretty printing for serialized HTML.
//!
//! Formatting only moves whitespace around block boundaries, so
//! `remove_source_formatting(add_source_formatting(html))` gives back the
//! compact form the serializer produced.

use std::sync::LazyLock;

use regex::Regex;

const BLOCKS: &str = "blockquote|ul|ol|li|h[1-6]|div|p|pre";

static BLOCK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\s*</({BLOCKS})>\s*")).unwrap());

static BLOCK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\s*<((?:{BLOCKS})(?: [^>]*)?)>")).unwrap());

static SEPARATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*<(!--.*?--|hr(?: [^>]*)?)>\s*").unwrap());

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<li([^>]*)>").unwrap());

static FORMATTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\s*<(/?(?:div|br|blockquote|ul|ol|li|p|pre|h1|h2|h3|h4|h5|h6|iframe|hr)\b[^>]*)>\s*",
    )
    .unwrap()
});

/// Put block tags on their own lines and indent list items.
pub fn add_source_formatting(html: &str) -> String {
    let html = BLOCK_CLOSE.replace_all(html, "</$1>\n");
    let html = BLOCK_OPEN.replace_all(&html, "\n<$1>");
    let html = SEPARATED.replace_all(&html, "\n\n<$1>\n\n");
    let html = LIST_ITEM.replace_all(&html, "\t<li$1>");
    html.trim().to_owned()
}

/// Strip the whitespace `add_source_formatting` puts around block tags.
pub fn remove_source_formatting(html: &str) -> String {
    FORMATTING.replace_all(html, "<$1>").trim().to_owned()
}
