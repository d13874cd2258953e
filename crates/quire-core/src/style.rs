//! Inline `style` attribute properties the converter understands.
//!
//! Only `color` and `text-align` are read. The attribute itself is kept on
//! the span as written, so it round-trips untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::color::parse_color;
use crate::span::Alignment;

static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:;|\A)color:(.+?)(?:;|$)").unwrap());

static TEXT_ALIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:;|\A)text-align:(.+?)(?:;|$)").unwrap());

/// Value of one declaration, matched with all whitespace removed.
fn property(style: &str, pattern: &Regex) -> Option<String> {
    let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
    pattern
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Foreground color from `color:`. `background-color` does not count.
pub fn style_color(style: &str, resources: &BTreeMap<SmolStr, u32>) -> Option<u32> {
    parse_color(&property(style, &COLOR)?, resources)
}

pub fn style_alignment(style: &str) -> Option<Alignment> {
    property(style, &TEXT_ALIGN).map(|value| Alignment::from_css(&value))
}
