//! quire-core: HTML to styled-text conversion and back.
//!
//! This crate provides:
//! - `StyledBuffer`, a rope of characters with formatting spans over it
//! - `Converter`, which builds a buffer from an HTML fragment
//! - `Serializer`, which writes a buffer back out as HTML
//! - a plugin system with hooks on both sides of the conversion
//! - `Editor`, a small action-driven editing surface

pub mod attributes;
pub mod buffer;
pub mod color;
pub mod config;
pub mod convert;
pub mod editor;
pub mod error;
pub mod format;
pub mod media;
pub mod parser;
pub mod plugins;
pub mod serialize;
pub mod span;
pub mod style;
pub mod tags;
pub mod text;

pub use attributes::Attributes;
pub use buffer::StyledBuffer;
pub use config::{ConverterConfig, SerializeOptions};
pub use convert::{Converter, from_html};
pub use editor::{BlockStyle, Editor, EditorAction, InlineStyle, Range, execute_action};
pub use error::{ConvertError, Result};
pub use format::{add_source_formatting, remove_source_formatting};
pub use media::{MediaCallbacks, MediaLoader, MediaRequest};
pub use plugins::{Plugin, PluginSet};
pub use serialize::{Serializer, to_html};
pub use smol_str::SmolStr;
pub use span::{Span, SpanId, SpanKind};
pub use text::{RopeText, TextBuffer};
