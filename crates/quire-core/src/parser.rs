//! HTML parser adapter.
//!
//! Wraps html5ever's fragment parser, which repairs real-world markup the way
//! browsers do, and replays the repaired tree as a SAX-style event stream.
//! The adapter owns the nesting level: it is raised before a start tag is
//! dispatched and lowered after its end tag is dispatched. Comment handlers
//! may move it.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::attributes::Attributes;
use crate::config::ConverterConfig;
use crate::error::Result;

/// Current element depth as seen by handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nesting {
    level: usize,
}

impl Nesting {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn set(&mut self, level: usize) {
        self.level = level;
    }

    fn enter(&mut self) -> usize {
        self.level += 1;
        self.level
    }

    fn exit(&mut self) {
        self.level = self.level.saturating_sub(1);
    }
}

/// Receiver of parser events, in document order.
pub trait HtmlHandler {
    fn start_tag(&mut self, name: &str, attrs: Attributes, nesting: usize);

    fn end_tag(&mut self, name: &str, nesting: usize);

    fn text(&mut self, text: &str, nesting: usize);

    /// Comments may rewrite the nesting level for all following events.
    fn comment(&mut self, text: &str, nesting: &mut Nesting);
}

enum Step {
    Enter(Handle),
    Exit(String),
}

/// Tolerant HTML fragment parser.
pub struct HtmlParser<'c> {
    config: &'c ConverterConfig,
}

impl<'c> HtmlParser<'c> {
    pub fn new(config: &'c ConverterConfig) -> Self {
        Self { config }
    }

    /// Parse a complete fragment and feed every event to `handler`.
    pub fn parse<H: HtmlHandler>(&self, html: &str, handler: &mut H) -> Result<()> {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![])
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        // Fragment parsing yields document > html > fragment nodes.
        let mut roots = Vec::new();
        for child in dom.document.children.borrow().iter() {
            match &child.data {
                NodeData::Element { name, .. } if name.local.as_ref() == "html" => {
                    roots.extend(child.children.borrow().iter().cloned());
                }
                _ => roots.push(child.clone()),
            }
        }

        let mut nesting = Nesting::default();
        let mut stack: Vec<Step> = roots.into_iter().rev().map(Step::Enter).collect();
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node) => self.enter(node, handler, &mut nesting, &mut stack),
                Step::Exit(name) => {
                    handler.end_tag(&name, nesting.level());
                    nesting.exit();
                }
            }
        }
        Ok(())
    }

    fn enter<H: HtmlHandler>(
        &self,
        node: Handle,
        handler: &mut H,
        nesting: &mut Nesting,
        stack: &mut Vec<Step>,
    ) {
        match &node.data {
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.as_ref().to_string();
                let children = node.children.borrow();
                if self.config.is_ignored(&tag) {
                    tracing::trace!(tag = %tag, "skipping ignored tag");
                    stack.extend(children.iter().rev().cloned().map(Step::Enter));
                    return;
                }
                let attrs = Attributes::from_pairs(
                    attrs
                        .borrow()
                        .iter()
                        .map(|attr| (attr.name.local.as_ref(), attr.value.to_string())),
                );
                let level = nesting.enter();
                handler.start_tag(&tag, attrs, level);
                stack.push(Step::Exit(tag));
                stack.extend(children.iter().rev().cloned().map(Step::Enter));
            }
            NodeData::Text { contents } => {
                handler.text(&contents.borrow(), nesting.level());
            }
            NodeData::Comment { contents } => {
                handler.comment(contents, nesting);
            }
            _ => {}
        }
    }
}
