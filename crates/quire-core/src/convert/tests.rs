use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;

use super::*;
use crate::config::SerializeOptions;
use crate::media::MediaRequest;
use crate::plugins::{Plugin, SpanPostprocessor, TagEvent, TagHandler, TextHandler};
use crate::serialize::to_html;
use crate::span::{Alignment, MediaKind, Span};

fn convert(html: &str) -> StyledBuffer {
    from_html(html, &ConverterConfig::default(), &PluginSet::new()).unwrap()
}

fn roundtrip(html: &str) -> String {
    to_html(&convert(html), &SerializeOptions::default(), &PluginSet::new())
}

fn spans_of<'a>(buffer: &'a StyledBuffer, name: &str) -> Vec<&'a Span> {
    buffer
        .spans()
        .map(|(_, span)| span)
        .filter(|span| span.kind.name() == name)
        .collect()
}

fn dump(buffer: &StyledBuffer) -> String {
    buffer
        .spans()
        .map(|(_, span)| {
            format!(
                "{} <{}> {}..{} #{}",
                span.kind.name(),
                span.tag,
                span.start,
                span.end.unwrap_or(span.start),
                span.seq
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_single_tag_roundtrip() {
    let corpus = [
        "<b>hello world</b>",
        "<i>world</i>",
        "<u>world</u>",
        "<del>world</del>",
        "<strike>world</strike>",
        "<sup>world</sup>",
        "<sub>world</sub>",
        "<tt>world</tt>",
        "<big>world</big>",
        "<small>world</small>",
        "<h1>world</h1>",
        "<h2>world</h2>",
        "<h3>world</h3>",
        "<h4>world</h4>",
        "<h5>world</h5>",
        "<h6>world</h6>",
        "<blockquote>world</blockquote>",
        "<p>world</p>",
    ];
    for html in corpus {
        assert_eq!(roundtrip(html), html, "roundtrip of {html}");
    }
}

#[test]
fn test_roundtrip_is_idempotent() {
    let corpus = [
        "<p>one</p>\n<p>two</p>",
        "<b>bold <i>both</i></b> after",
        "<ul>\n<li>a</li>\n<li>b <b>c</b></li>\n</ul>",
        "intro<hr>outro",
        "a<!-- note -->b<!--more-->c",
        "<xyz foo=\"1\">bar <b>baz</b></xyz> tail",
        "<pre>  keep\n   this</pre>",
        "<font color=\"red\" face=\"serif\">styled</font>",
        "x &lt; y &amp; caf\u{e9}",
    ];
    for html in corpus {
        let once = roundtrip(html);
        assert_eq!(roundtrip(&once), once, "idempotence of {html}");
    }
}

type SpanSet = Vec<(SpanKind, Option<std::ops::Range<usize>>, Attributes)>;

fn span_set(buffer: &StyledBuffer) -> SpanSet {
    buffer
        .spans()
        .map(|(_, span)| (span.kind.clone(), span.range(), span.attrs.clone()))
        .collect()
}

#[test]
fn test_roundtrip_preserves_span_set() {
    let corpus = [
        "<p>one</p>\n<p>two</p>",
        "<b>bold <i>both</i></b> after",
        "<ul>\n<li>a</li>\n<li>b <b>c</b></li>\n</ul>",
        "intro<hr>outro",
        "a<!-- note -->b<!--more-->c",
        "<xyz foo=\"1\">bar <b>baz</b></xyz> tail",
        "<pre>  keep\n   this</pre>",
        "<font color=\"red\" face=\"serif\">styled</font>",
        "<p style=\"color: blue; text-align: center\">styled</p>",
        "<video src=\"a.mp4\"><source src=\"b.mp4\">fallback</video> after",
        "<blockquote>a<br><br></blockquote>",
        "tab\there",
    ];
    for html in corpus {
        let first = convert(html);
        let second = convert(&to_html(
            &first,
            &SerializeOptions::default(),
            &PluginSet::new(),
        ));
        assert_eq!(span_set(&second), span_set(&first), "span set of {html}");
        assert_eq!(second.to_plain_string(), first.to_plain_string(), "text of {html}");
    }
}

#[test]
fn test_unknown_tag_preserved_verbatim() {
    let buffer = convert("<xyz foo=\"1\">bar</xyz>");
    let unknown = spans_of(&buffer, "unknown-html");
    assert_eq!(unknown.len(), 1);
    assert_eq!(
        unknown[0].kind,
        SpanKind::UnknownHtml("<xyz foo=\"1\">bar</xyz>".to_string())
    );
    assert_eq!(buffer.to_plain_string(), OBJECT_CHAR.to_string());
    assert_eq!(roundtrip("<xyz foo=\"1\">bar</xyz>"), "<xyz foo=\"1\">bar</xyz>");
}

#[test]
fn test_unknown_tag_captures_known_children() {
    let buffer = convert("a<xyz><b>x</b> &amp; y<br>z</xyz>b");
    assert!(spans_of(&buffer, "bold").is_empty());
    let unknown = spans_of(&buffer, "unknown-html");
    assert_eq!(unknown.len(), 1);
    assert_eq!(
        unknown[0].kind,
        SpanKind::UnknownHtml("<xyz><b>x</b> &amp; y<br>z</xyz>".to_string())
    );
    assert_eq!(buffer.to_plain_string(), format!("a{OBJECT_CHAR}b"));
}

#[test]
fn test_unknown_listener_notified() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let plugins =
        PluginSet::new().on_unknown_html(move |raw| sink.borrow_mut().push(raw.to_owned()));
    from_html("<xyz>one</xyz><abc/>", &ConverterConfig::default(), &plugins).unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[0], "<xyz>one</xyz>");
}

#[test]
fn test_whitespace_collapses() {
    assert_eq!(convert("hello   \n  world").to_plain_string(), "hello world");
    assert_eq!(
        convert("<b>hello </b>  <i> world</i>").to_plain_string(),
        "hello world"
    );
}

#[test]
fn test_tabs_kept_and_escaped() {
    let buffer = convert("a\tb  c");
    assert_eq!(buffer.to_plain_string(), "a\tb c");
    assert_eq!(roundtrip("a\tb"), "a&#9;b");
}

#[test]
fn test_whitespace_kept_without_collapsing() {
    let config = ConverterConfig {
        collapse_whitespace: false,
        ..ConverterConfig::default()
    };
    let buffer = from_html("a  b", &config, &PluginSet::new()).unwrap();
    assert_eq!(buffer.to_plain_string(), "a  b");
}

#[test]
fn test_pre_preserves_whitespace() {
    let buffer = convert("<pre>hello   \n  world</pre>");
    let pre = spans_of(&buffer, "preformat");
    assert_eq!(pre.len(), 1);
    let range = pre[0].range().unwrap();
    assert_eq!(
        buffer.slice(range.start..range.end - 1).as_deref(),
        Some("hello   \n  world")
    );
    assert_eq!(
        roundtrip("<pre>hello   \n  world</pre>"),
        "<pre>hello   \n  world</pre>"
    );
}

#[test]
fn test_code_preserves_whitespace() {
    assert_eq!(convert("<code>a   b</code>").to_plain_string(), "a   b");
    assert_eq!(roundtrip("<code>a   b</code>"), "<code>a   b</code>");
}

#[test]
fn test_nested_spans_in_open_order() {
    let buffer = convert("<b><i>x</i></b>");
    let bold = spans_of(&buffer, "bold");
    let italic = spans_of(&buffer, "italic");
    assert_eq!(bold.len(), 1);
    assert_eq!(italic.len(), 1);
    assert!(bold[0].seq < italic[0].seq);
    assert_eq!(bold[0].range(), Some(0..1));
    assert_eq!(italic[0].range(), Some(0..1));
    assert!(buffer.open_spans().next().is_none());
}

#[test]
fn test_list_source_formatting() {
    let html = roundtrip("<ul><li>world</li></ul>");
    assert_eq!(html, "<ul><li>world</li></ul>");
    let options = SerializeOptions::source();
    let pretty = to_html(&convert(&html), &options, &PluginSet::new());
    assert_eq!(pretty, "<ul>\n\t<li>world</li>\n</ul>");
}

#[test]
fn test_stray_close_is_ignored() {
    let buffer = convert("</b>text");
    assert!(spans_of(&buffer, "bold").is_empty());
    assert_eq!(buffer.to_plain_string(), "text");
}

#[test]
fn test_link_href() {
    let buffer = convert("<a href='URL'>site</a>");
    let links = spans_of(&buffer, "link");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href(), Some("URL"));
    assert_eq!(roundtrip("<a href='URL'>site</a>"), "<a href=\"URL\">site</a>");
}

#[test]
fn test_paragraphs_and_empty_blocks() {
    let buffer = convert("<p>one</p><p>two</p>");
    assert_eq!(buffer.to_plain_string(), "one\ntwo\n");
    let paragraphs = spans_of(&buffer, "paragraph");
    assert_eq!(paragraphs[0].range(), Some(0..4));
    assert_eq!(paragraphs[1].range(), Some(4..8));

    assert_eq!(roundtrip("<p></p>"), "<p></p>");
    assert_eq!(roundtrip("intro<p>body</p>tail"), "intro<p>body</p>tail");
}

#[test]
fn test_trailing_line_break_in_block_kept() {
    let buffer = convert("<p>a<br></p>");
    assert_eq!(buffer.to_plain_string(), "a\n\u{200B}\n");
    assert_eq!(spans_of(&buffer, "paragraph")[0].range(), Some(0..4));

    for html in [
        "<p>a<br></p>",
        "<blockquote>a<br><br></blockquote>",
        "a<br><p>b</p>",
        "<p>a</p><br><p>c</p>",
        "<ul><li>a<br></li></ul>",
    ] {
        assert_eq!(roundtrip(html), html, "roundtrip of {html}");
    }
}

#[test]
fn test_line_break() {
    assert_eq!(convert("a<br>b").to_plain_string(), "a\nb");
    assert_eq!(roundtrip("a<br>b"), "a<br>b");
}

#[test]
fn test_horizontal_rule() {
    let buffer = convert("a<hr>b");
    assert_eq!(buffer.to_plain_string(), format!("a\n{MAGIC_CHAR}\nb"));
    assert_eq!(spans_of(&buffer, "horizontal-rule")[0].range(), Some(2..4));
    assert_eq!(roundtrip("a<hr>b"), "a<hr>b");
}

#[test]
fn test_comments() {
    let buffer = convert("a<!-- note -->b");
    let comments = spans_of(&buffer, "comment");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].kind, SpanKind::Comment(CommentKind::Plain));
    assert_eq!(roundtrip("a<!-- note -->b"), "a<!-- note -->b");

    let buffer = convert("one<!--more-->two<!-- NextPage -->three");
    let kinds: Vec<_> = spans_of(&buffer, "comment")
        .into_iter()
        .map(|span| span.kind.clone())
        .collect();
    assert_eq!(
        kinds,
        [
            SpanKind::Comment(CommentKind::More),
            SpanKind::Comment(CommentKind::PageBreak)
        ]
    );
    assert_eq!(
        buffer.to_plain_string(),
        format!("one{MAGIC_CHAR}two{MAGIC_CHAR}three")
    );
    assert_eq!(
        roundtrip("one<!--more-->two<!--nextpage-->three"),
        "one<!--more-->two<!--nextpage-->three"
    );
}

#[test]
fn test_font_color_resolution() {
    let buffer = convert("<font color=\"#ff0000\">red</font>");
    assert_eq!(spans_of(&buffer, "color")[0].kind, SpanKind::Color(0xffff0000));
    assert_eq!(
        roundtrip("<font color=\"#ff0000\">red</font>"),
        "<font color=\"#ff0000\">red</font>"
    );

    let buffer = convert("<font color=\"nonsense\" face=\"serif\">x</font>");
    assert!(spans_of(&buffer, "color").is_empty());
    assert_eq!(
        spans_of(&buffer, "typeface")[0].kind,
        SpanKind::Typeface("serif".into())
    );
    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &PluginSet::new()),
        "<font face=\"serif\">x</font>"
    );
}

#[test]
fn test_style_attribute_color_and_alignment() {
    let html = "<p style=\"text-align: center\">a <span style=\"color: red\">b</span></p>";
    let buffer = convert(html);
    let colors = spans_of(&buffer, "color");
    assert_eq!(colors.len(), 1);
    assert_eq!(colors[0].kind, SpanKind::Color(0xffff0000));
    assert_eq!(colors[0].range(), Some(2..3));

    let aligned = spans_of(&buffer, "alignment");
    assert_eq!(aligned.len(), 1);
    assert_eq!(aligned[0].kind, SpanKind::Alignment(Alignment::Center));
    assert_eq!(aligned[0].range(), spans_of(&buffer, "paragraph")[0].range());
    assert_eq!(roundtrip(html), html);

    // Alignment only applies to paragraph-level spans.
    let buffer = convert("<b style=\"text-align:right;color:nope\">x</b>");
    assert!(spans_of(&buffer, "alignment").is_empty());
    assert!(spans_of(&buffer, "color").is_empty());
}

#[test]
fn test_font_color_resource() {
    let config = ConverterConfig::default().with_color_resource("accent", 0x00ff00);
    let buffer = from_html(
        "<font color=\"@accent\">x</font>",
        &config,
        &PluginSet::new(),
    )
    .unwrap();
    assert_eq!(spans_of(&buffer, "color")[0].kind, SpanKind::Color(0x00ff00));
    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &PluginSet::new()),
        "<font color=\"#00ff00\">x</font>"
    );
}

#[test]
fn test_ignored_tags_keep_children() {
    let config = ConverterConfig::default().with_ignored_tag("span");
    let buffer = from_html("a<span>b</span>c", &config, &PluginSet::new()).unwrap();
    assert_eq!(buffer.to_plain_string(), "abc");
    assert_eq!(buffer.spans().count(), 0);
}

#[test]
fn test_cursor_marker() {
    let html = "ab<quire_cursor></quire_cursor>c";
    let buffer = convert(html);
    assert_eq!(buffer.to_plain_string(), "abc");
    let cursor = spans_of(&buffer, "cursor");
    assert_eq!(cursor[0].range(), Some(2..2));

    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &PluginSet::new()),
        "abc"
    );
    let options = SerializeOptions {
        with_cursor: true,
        ..SerializeOptions::default()
    };
    assert_eq!(to_html(&buffer, &options, &PluginSet::new()), html);
}

#[test]
fn test_cursor_inside_unknown_content() {
    let buffer = convert("a<xyz>b<quire_cursor></quire_cursor>c</xyz>");
    let unknown = spans_of(&buffer, "unknown-html");
    assert_eq!(unknown[0].kind, SpanKind::UnknownHtml("<xyz>bc</xyz>".into()));
    assert_eq!(spans_of(&buffer, "cursor")[0].range(), Some(1..1));
}

#[derive(Default)]
struct RecordingLoader {
    requests: RefCell<Vec<MediaRequest>>,
}

impl MediaLoader for RecordingLoader {
    fn load_image(&self, request: MediaRequest) {
        self.requests.borrow_mut().push(request);
    }

    fn load_video_thumbnail(&self, request: MediaRequest) {
        self.requests.borrow_mut().push(request);
    }
}

#[test]
fn test_media_placeholder_and_load_request() {
    let loader = RecordingLoader::default();
    let config = ConverterConfig::default();
    let plugins = PluginSet::new();
    let buffer = Converter::new(&config, &plugins)
        .with_media_loader(&loader)
        .convert("a<img src=\"pic.png\">b<audio src=\"x.mp3\"></audio>")
        .unwrap();

    assert_eq!(
        buffer.to_plain_string(),
        format!("a{OBJECT_CHAR}b{OBJECT_CHAR}")
    );
    let requests = loader.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, MediaKind::Image);
    assert_eq!(requests[0].source, "pic.png");
    assert_eq!(requests[0].max_width, 800);
    assert_eq!(
        buffer.get(requests[0].span).map(|span| span.kind.clone()),
        Some(SpanKind::Media {
            kind: MediaKind::Image,
            children: String::new(),
        })
    );

    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &plugins),
        "a<img src=\"pic.png\">b<audio src=\"x.mp3\"></audio>"
    );
}

#[test]
fn test_media_children_stay_inside_element() {
    let html = "<video src=\"a.mp4\"><source src=\"b.mp4\"></video>";
    let buffer = convert(html);
    assert_eq!(buffer.to_plain_string(), OBJECT_CHAR.to_string());
    assert!(spans_of(&buffer, "unknown-html").is_empty());
    let media = spans_of(&buffer, "media");
    assert_eq!(media.len(), 1);
    assert_eq!(
        media[0].kind,
        SpanKind::Media {
            kind: MediaKind::Video,
            children: "<source src=\"b.mp4\">".into(),
        }
    );
    assert_eq!(roundtrip(html), html);
}

#[test]
fn test_media_fallback_text_not_in_buffer() {
    let html = "<video src=\"a.mp4\">fallback <b>text</b></video>after";
    let buffer = convert(html);
    assert_eq!(buffer.to_plain_string(), format!("{OBJECT_CHAR}after"));
    assert!(spans_of(&buffer, "bold").is_empty());
    assert_eq!(roundtrip(html), html);
}

#[test]
fn test_entities_and_non_ascii_escaped() {
    let buffer = convert("x &lt; y &amp; caf\u{e9}");
    assert_eq!(buffer.to_plain_string(), "x < y & caf\u{e9}");
    assert_eq!(
        roundtrip("x &lt; y &amp; caf\u{e9}"),
        "x &lt; y &amp; caf&#233;"
    );
}

#[test]
fn test_gutenberg_block_comments() {
    let plugins = PluginSet::new().with(Plugin::gutenberg_comments());
    let html = "<!-- wp:paragraph --><p>hi</p><!-- /wp:paragraph -->";
    let buffer = from_html(html, &ConverterConfig::default(), &plugins).unwrap();

    let blocks = spans_of(&buffer, "comment-block");
    assert_eq!(blocks.len(), 1);
    assert_eq!(
        blocks[0].kind,
        SpanKind::CommentBlock {
            opening: " wp:paragraph ".into(),
            closing: Some(" /wp:paragraph ".into()),
        }
    );
    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &plugins),
        html
    );
}

#[test]
fn test_audio_shortcode_roundtrip() {
    let plugins = PluginSet::new().with(Plugin::audio_shortcode());
    let html = "before[audio src=\"a.mp3\"]after";
    let buffer = from_html(html, &ConverterConfig::default(), &plugins).unwrap();
    assert_eq!(spans_of(&buffer, "media").len(), 1);
    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &plugins),
        html
    );
}

#[test]
fn test_caption_shortcode_roundtrip() {
    let plugins = PluginSet::new().with(Plugin::caption_shortcode());
    let html = "[caption id=\"c1\" align=\"alignleft\"]<img src=\"a.png\"> A cat[/caption]";
    let buffer = from_html(html, &ConverterConfig::default(), &plugins).unwrap();

    assert_eq!(buffer.to_plain_string(), format!("{OBJECT_CHAR} A cat"));
    let captions = spans_of(&buffer, "caption");
    assert_eq!(captions.len(), 1);
    assert_eq!(captions[0].range(), Some(0..7));
    assert_eq!(captions[0].attrs.get("id"), Some("c1"));
    assert_eq!(
        spans_of(&buffer, "alignment")[0].kind,
        SpanKind::Alignment(Alignment::Left)
    );
    assert!(spans_of(&buffer, "unknown-html").is_empty());
    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &plugins),
        html
    );
}

#[test]
fn test_caption_shortcode_joins_lines() {
    let plugins = PluginSet::new().with(Plugin::caption_shortcode());
    let buffer = from_html(
        "[caption]<img src=\"a.png\"><br>two<br>lines<br>[/caption]",
        &ConverterConfig::default(),
        &plugins,
    )
    .unwrap();
    assert_eq!(buffer.to_plain_string(), format!("{OBJECT_CHAR} two lines"));
    assert_eq!(spans_of(&buffer, "caption")[0].range(), Some(0..11));
}

/// Serves `<b>` as underline, claiming both the start and the end tag.
struct BoldAsUnderline;

impl TagHandler for BoldAsUnderline {
    fn can_handle_tag(&self, tag: &str) -> bool {
        tag == "b"
    }

    fn handle_tag(&self, event: TagEvent<'_>, buffer: &mut StyledBuffer) -> bool {
        if event.opening {
            buffer.open(SpanKind::Underline, "u", event.attrs.clone(), event.nesting);
        } else {
            buffer.close(&SpanKind::Underline).unwrap();
        }
        true
    }
}

#[test]
fn test_tag_handler_claims_start_and_end() {
    let plugins =
        PluginSet::new().with(Plugin::new("bold-as-underline").with_tag_handler(BoldAsUnderline));
    let buffer = from_html("<b>x</b>y<i>z</i>", &ConverterConfig::default(), &plugins).unwrap();
    assert!(spans_of(&buffer, "bold").is_empty());
    assert_eq!(spans_of(&buffer, "underline")[0].range(), Some(0..1));
    assert_eq!(spans_of(&buffer, "italic")[0].range(), Some(2..3));
    assert_eq!(
        to_html(&buffer, &SerializeOptions::default(), &plugins),
        "<u>x</u>y<i>z</i>"
    );
}

/// Opens bold at `<shout>` and swallows the end tag without closing it.
struct Shout;

impl TagHandler for Shout {
    fn can_handle_tag(&self, tag: &str) -> bool {
        tag == "shout"
    }

    fn handle_tag(&self, event: TagEvent<'_>, buffer: &mut StyledBuffer) -> bool {
        if event.opening {
            buffer.open(SpanKind::Bold, "b", Attributes::new(), event.nesting);
        }
        true
    }
}

#[test]
fn test_finish_closes_dangling_spans() {
    let plugins = PluginSet::new().with(Plugin::new("shout").with_tag_handler(Shout));
    let buffer = from_html("<shout>loud</shout> tail", &ConverterConfig::default(), &plugins)
        .unwrap();
    assert!(buffer.open_spans().next().is_none());
    assert_eq!(spans_of(&buffer, "bold")[0].range(), Some(0..9));
    assert!(spans_of(&buffer, "unknown-html").is_empty());
}

/// Builds paragraphs from `<para>` with plain open and close, leaving the
/// trailing newlines to the finalize pass.
struct Para;

impl TagHandler for Para {
    fn can_handle_tag(&self, tag: &str) -> bool {
        tag == "para"
    }

    fn handle_tag(&self, event: TagEvent<'_>, buffer: &mut StyledBuffer) -> bool {
        if event.opening {
            buffer.open(SpanKind::Paragraph, "p", Attributes::new(), event.nesting);
        } else {
            buffer.close(&SpanKind::Paragraph).unwrap();
        }
        true
    }
}

#[test]
fn test_finish_trims_trailing_blank_line() {
    let plugins = PluginSet::new().with(Plugin::new("para").with_tag_handler(Para));
    let buffer = from_html("<para>a<br><br></para>b", &ConverterConfig::default(), &plugins)
        .unwrap();
    assert_eq!(buffer.to_plain_string(), "a\n\nb");
    assert_eq!(spans_of(&buffer, "paragraph")[0].range(), Some(0..2));
}

#[test]
fn test_finish_drops_paragraph_left_empty_by_trim() {
    let plugins = PluginSet::new().with(Plugin::new("para").with_tag_handler(Para));
    let buffer = from_html("a<br><para><br></para>b", &ConverterConfig::default(), &plugins)
        .unwrap();
    assert_eq!(buffer.to_plain_string(), "a\n\nb");
    assert!(spans_of(&buffer, "paragraph").is_empty());
}

struct Smiley(Regex);

impl TextHandler for Smiley {
    fn pattern(&self) -> &Regex {
        &self.0
    }

    fn on_match(&self, _text: &str, buffer: &mut StyledBuffer, nesting: usize) -> bool {
        let start = buffer.len();
        buffer.push_char(OBJECT_CHAR);
        buffer.attach(
            SpanKind::UnknownHtml("<img alt=\":)\">".into()),
            "img",
            Attributes::new(),
            start..buffer.len(),
            nesting,
        );
        true
    }
}

#[test]
fn test_text_handler_takes_matches() {
    let plugins = PluginSet::new().with(
        Plugin::new("smiley").with_text_handler(Smiley(Regex::new(r":\)").unwrap())),
    );
    let buffer = from_html("hi :) there :)", &ConverterConfig::default(), &plugins).unwrap();
    assert_eq!(
        buffer.to_plain_string(),
        format!("hi {OBJECT_CHAR} there {OBJECT_CHAR}")
    );
    assert_eq!(spans_of(&buffer, "unknown-html").len(), 2);
}

struct DropBold;

impl SpanPostprocessor for DropBold {
    fn after_spans_processed(&self, buffer: &mut StyledBuffer) {
        let bold: Vec<_> = buffer
            .spans()
            .filter(|(_, span)| span.kind == SpanKind::Bold)
            .map(|(id, _)| id)
            .collect();
        for id in bold {
            buffer.remove(id);
        }
    }
}

#[test]
fn test_span_postprocessor_runs_after_conversion() {
    let plugins =
        PluginSet::new().with(Plugin::new("drop-bold").with_span_postprocessor(DropBold));
    let buffer = from_html("<b>a</b><i>b</i>", &ConverterConfig::default(), &plugins).unwrap();
    assert!(spans_of(&buffer, "bold").is_empty());
    assert_eq!(spans_of(&buffer, "italic").len(), 1);
}

#[test]
fn test_span_layout_snapshot() {
    let buffer = convert("<h1>Title</h1><p>Some <b>bold <i>text</i></b></p>");
    insta::assert_snapshot!("span_layout", dump(&buffer));
}
