//! Block editor comment delimiters.
//!
//! `<!-- wp:name -->` ... `<!-- /wp:name -->` pairs become a block span that
//! remembers both comment bodies. The pair acts like an element, so the
//! nesting level goes up at the opening comment and back down at the close.
//! Self-closing `<!-- wp:name /-->` comments become a hidden marker.

use crate::attributes::Attributes;
use crate::buffer::StyledBuffer;
use crate::parser::Nesting;
use crate::span::{MAGIC_CHAR, SpanKind};

use super::CommentHandler;

const TAG: &str = "wp-block";

#[derive(Debug, Clone, Copy, Default)]
pub struct GutenbergComments;

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn block_key() -> SpanKind {
    SpanKind::CommentBlock {
        opening: String::new(),
        closing: None,
    }
}

impl CommentHandler for GutenbergComments {
    fn handle_comment(
        &self,
        text: &str,
        buffer: &mut StyledBuffer,
        nesting: &mut Nesting,
    ) -> bool {
        let trimmed = text.trim_start();

        if starts_with_ignore_case(trimmed, "wp:") {
            if text.trim_end().ends_with('/') {
                let start = buffer.len();
                buffer.push_char(MAGIC_CHAR);
                buffer.attach(
                    SpanKind::HiddenComment(text.to_string()),
                    TAG,
                    Attributes::new(),
                    start..buffer.len(),
                    nesting.level(),
                );
            } else {
                let level = nesting.level() + 1;
                buffer.open_block(
                    SpanKind::CommentBlock {
                        opening: text.to_string(),
                        closing: None,
                    },
                    TAG,
                    Attributes::new(),
                    level,
                );
                nesting.set(level);
            }
            return true;
        }

        if starts_with_ignore_case(trimmed, "/wp:") {
            let key = block_key();
            if let Some(span) = buffer
                .peek_open_id(&key)
                .and_then(|id| buffer.get_mut(id))
            {
                if let SpanKind::CommentBlock { closing, .. } = &mut span.kind {
                    *closing = Some(text.to_string());
                }
            }
            if let Err(err) = buffer.close_block(&key) {
                tracing::debug!(error = %err, "failed to close comment block");
            }
            nesting.set(nesting.level().saturating_sub(1));
            return true;
        }

        false
    }
}
