//! 静态 HTML 正文提取
//!
//! 不执行 JavaScript 时使用：解析 DOM 后按 article → main → body 选择正文容器，
//! 再遍历块级元素生成 [`ContentBlock`]。脚本、布局与评论区按子树整体跳过

use std::sync::LazyLock;

use reqwest::Url;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractionConfig;
use crate::models::{ContentBlock, PageMetadata};
use crate::services::page_script::PagePayload;

macro_rules! static_selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect("static selector is valid"));
    };
}

static_selector!(ARTICLE, "article");
static_selector!(MAIN, "main, [role='main']");
static_selector!(BODY, "body");
static_selector!(TITLE, "title");
static_selector!(META, "meta");
static_selector!(ROW, "tr");
static_selector!(CELL, "th, td");

/// 从不产出正文的元素
const NOISE_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe", "head"];
/// 页面布局元素
const LAYOUT_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];
/// 行内渲染时前后补空格的元素
const BLOCK_LIKE_TAGS: &[&str] = &["div", "p", "li", "tr", "td", "th", "section", "dd", "dt"];

/// 提取正文少于这个长度的容器不被采用
const MIN_CONTAINER_TEXT: usize = 200;

/// 从 HTML 中提取正文块与元数据
pub fn extract_from_html(html: &str, base_url: &str, config: &ExtractionConfig) -> PagePayload {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();
    let walker = BlockWalker {
        base: base.as_ref(),
        config,
    };

    let blocks = walker
        .select_container(&document)
        .map(|container| walker.collect_blocks(container))
        .unwrap_or_default();

    PagePayload {
        blocks,
        metadata: extract_metadata(&document, base.as_ref()),
        final_url: None,
    }
}

struct BlockWalker<'a> {
    base: Option<&'a Url>,
    config: &'a ExtractionConfig,
}

impl BlockWalker<'_> {
    /// 选择正文容器：article → main → body
    fn select_container<'d>(&self, document: &'d Html) -> Option<ElementRef<'d>> {
        for selector in [&*ARTICLE, &*MAIN] {
            let found = document
                .select(selector)
                .find(|el| self.inline_text(*el).chars().count() >= MIN_CONTAINER_TEXT);
            if found.is_some() {
                return found;
            }
        }
        if self.config.favor_precision {
            return None;
        }
        Some(
            document
                .select(&BODY)
                .next()
                .unwrap_or_else(|| document.root_element()),
        )
    }

    fn collect_blocks(&self, container: ElementRef<'_>) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        self.walk(container, false, &mut blocks);

        if blocks.is_empty() {
            let text = self.inline_text(container);
            if !text.is_empty() {
                blocks.push(ContentBlock::Paragraph { text });
            }
        }
        blocks
    }

    fn walk(&self, element: ElementRef<'_>, ordered: bool, blocks: &mut Vec<ContentBlock>) {
        for child in element.children().filter_map(ElementRef::wrap) {
            if self.is_skipped(child) {
                continue;
            }
            let name = child.value().name();
            let block = match name {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(ContentBlock::Heading {
                    level: name[1..].parse().unwrap_or(1),
                    text: self.plain_text(child),
                }),
                "p" => Some(ContentBlock::Paragraph {
                    text: self.inline_text(child),
                }),
                "li" => Some(ContentBlock::ListItem {
                    text: self.inline_text(child),
                    ordered,
                }),
                "blockquote" => Some(ContentBlock::Quote {
                    text: self.inline_text(child),
                }),
                "pre" => Some(ContentBlock::Code {
                    text: child.text().collect::<String>().trim_end().to_string(),
                }),
                "table" => self
                    .config
                    .include_tables
                    .then(|| ContentBlock::Table {
                        rows: self.table_rows(child),
                    }),
                "img" => self
                    .config
                    .include_images
                    .then(|| self.image_block(child))
                    .flatten(),
                "ul" => {
                    self.walk(child, false, blocks);
                    None
                }
                "ol" => {
                    self.walk(child, true, blocks);
                    None
                }
                _ => {
                    self.walk(child, ordered, blocks);
                    None
                }
            };

            if let Some(block) = block.filter(|b| !is_empty_block(b)) {
                blocks.push(block);
            }
        }
    }

    /// 噪声、布局以及（未开启时的）评论区整棵子树都不参与提取
    fn is_skipped(&self, element: ElementRef<'_>) -> bool {
        let name = element.value().name();
        NOISE_TAGS.contains(&name)
            || LAYOUT_TAGS.contains(&name)
            || (!self.config.include_comments && is_comment_section(element))
    }

    fn table_rows(&self, table: ElementRef<'_>) -> Vec<Vec<String>> {
        table
            .select(&ROW)
            .filter_map(|row| {
                let cells: Vec<String> = row.select(&CELL).map(|cell| self.plain_text(cell)).collect();
                (!cells.is_empty()).then_some(cells)
            })
            .collect()
    }

    fn image_block(&self, img: ElementRef<'_>) -> Option<ContentBlock> {
        let src = img.value().attr("src")?;
        Some(ContentBlock::Image {
            src: resolve(src, self.base),
            alt: img.value().attr("alt").unwrap_or_default().to_string(),
        })
    }

    /// 行内文本，开启链接时改写为 markdown 链接
    fn inline_text(&self, element: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.push_inline(element, self.config.include_links, &mut out);
        collapse_whitespace(&out)
    }

    fn plain_text(&self, element: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.push_inline(element, false, &mut out);
        collapse_whitespace(&out)
    }

    fn push_inline(&self, element: ElementRef<'_>, links: bool, out: &mut String) {
        for node in element.children() {
            match node.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(node) else {
                        continue;
                    };
                    if self.is_skipped(child) {
                        continue;
                    }
                    let name = child.value().name();
                    if name == "br" {
                        out.push(' ');
                    } else if name == "a" && links {
                        let mut label = String::new();
                        self.push_inline(child, false, &mut label);
                        let label = collapse_whitespace(&label);
                        match child.value().attr("href") {
                            Some(href) if !label.is_empty() => {
                                out.push_str(&format!("[{}]({})", label, resolve(href, self.base)));
                            }
                            _ => out.push_str(&label),
                        }
                    } else if BLOCK_LIKE_TAGS.contains(&name) {
                        out.push(' ');
                        self.push_inline(child, links, out);
                        out.push(' ');
                    } else {
                        self.push_inline(child, links, out);
                    }
                }
                _ => {}
            }
        }
    }
}

/// class 或 id 中带 comment 的容器视为评论区
fn is_comment_section(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if !matches!(value.name(), "div" | "section" | "ul" | "ol") {
        return false;
    }
    let mentions_comment = |s: &str| s.to_ascii_lowercase().contains("comment");
    value.id().is_some_and(mentions_comment) || value.classes().any(mentions_comment)
}

fn is_empty_block(block: &ContentBlock) -> bool {
    match block {
        ContentBlock::Heading { text, .. }
        | ContentBlock::Paragraph { text }
        | ContentBlock::ListItem { text, .. }
        | ContentBlock::Quote { text }
        | ContentBlock::Code { text } => text.trim().is_empty(),
        ContentBlock::Table { rows } => rows.is_empty(),
        ContentBlock::Image { src, .. } => src.is_empty(),
    }
}

fn resolve(href: &str, base: Option<&Url>) -> String {
    base.and_then(|base| base.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| href.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_metadata(document: &Html, base: Option<&Url>) -> PageMetadata {
    let metas: Vec<ElementRef<'_>> = document.select(&META).collect();

    let content_of = |meta: &ElementRef<'_>| {
        meta.value()
            .attr("content")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    };
    let lookup = |key: &str| -> Option<String> {
        metas.iter().find_map(|meta| {
            let value = meta.value();
            value
                .attr("name")
                .or_else(|| value.attr("property"))
                .is_some_and(|name| name.eq_ignore_ascii_case(key))
                .then(|| content_of(meta))
                .flatten()
        })
    };
    let lookup_all = |key: &str| -> Vec<String> {
        metas
            .iter()
            .filter(|meta| {
                meta.value()
                    .attr("property")
                    .is_some_and(|p| p.eq_ignore_ascii_case(key))
            })
            .filter_map(content_of)
            .collect()
    };

    let title = lookup("og:title").or_else(|| {
        document
            .select(&TITLE)
            .next()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    });

    PageMetadata {
        title,
        author: lookup("author").or_else(|| lookup("article:author")),
        date: lookup("article:published_time").or_else(|| lookup("date")),
        description: lookup("description").or_else(|| lookup("og:description")),
        sitename: lookup("og:site_name"),
        hostname: base.and_then(|b| b.host_str()).map(String::from),
        language: document
            .root_element()
            .value()
            .attr("lang")
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty()),
        categories: lookup_all("article:section"),
        tags: lookup_all("article:tag"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en-US">
<head>
  <title>Fallback &amp; Title</title>
  <meta property="og:title" content="Real Title">
  <meta name="author" content="Ada">
  <meta property="article:tag" content="rust">
  <meta property="article:tag" content="async">
  <script>var x = "<p>not content</p>";</script>
</head>
<body>
  <nav><p>Home | About</p></nav>
  <h1>Heading</h1>
  <p>First <a href="/docs">paragraph</a> &lt;here&gt;.</p>
  <ul><li>one</li><li>two</li></ul>
  <pre><code>fn main() {}</code></pre>
  <table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2</td></tr></table>
  <img src="/logo.png" alt="Logo">
  <div class="comments"><p>spam comment</p></div>
  <footer><p>footer text</p></footer>
</body>
</html>"#;

    fn texts(blocks: &[ContentBlock]) -> Vec<String> {
        blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Paragraph { text } | ContentBlock::ListItem { text, .. } => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn extracts_blocks_in_document_order() {
        let payload = extract_from_html(PAGE, "https://example.com/a", &ExtractionConfig::default());
        assert_eq!(
            payload.blocks[0],
            ContentBlock::Heading {
                level: 1,
                text: "Heading".into()
            }
        );
        assert_eq!(texts(&payload.blocks), vec!["First paragraph <here>.", "one", "two"]);
        assert!(payload
            .blocks
            .iter()
            .any(|b| matches!(b, ContentBlock::Code { text } if text == "fn main() {}")));
        assert!(payload.blocks.contains(&ContentBlock::Table {
            rows: vec![vec!["a".into(), "b".into()], vec!["1".into(), "2".into()]]
        }));
    }

    #[test]
    fn layout_scripts_and_comments_are_dropped() {
        let payload = extract_from_html(PAGE, "https://example.com/a", &ExtractionConfig::default());
        let all = texts(&payload.blocks).join(" ");
        assert!(!all.contains("Home"));
        assert!(!all.contains("footer"));
        assert!(!all.contains("spam"));
        assert!(!all.contains("not content"));
    }

    #[test]
    fn nested_comment_section_is_dropped_as_a_whole() {
        let html = format!(
            r#"<html><body><article><p>{}</p><div class="comments"><div>inner</div><p>SPAM COMMENT</p></div></article></body></html>"#,
            "x".repeat(250)
        );
        let payload = extract_from_html(&html, "https://example.com/a", &ExtractionConfig::default());
        assert_eq!(payload.blocks.len(), 1);
        assert!(!texts(&payload.blocks).join(" ").contains("SPAM"));

        let config = ExtractionConfig {
            include_comments: true,
            ..ExtractionConfig::default()
        };
        let payload = extract_from_html(&html, "https://example.com/a", &config);
        assert!(texts(&payload.blocks).contains(&"SPAM COMMENT".to_string()));
    }

    #[test]
    fn ordered_lists_are_marked() {
        let html = "<body><ol><li>first</li><li>second</li></ol><ul><li>dot</li></ul></body>";
        let payload = extract_from_html(html, "https://example.com/", &ExtractionConfig::default());
        assert_eq!(
            payload.blocks,
            vec![
                ContentBlock::ListItem { text: "first".into(), ordered: true },
                ContentBlock::ListItem { text: "second".into(), ordered: true },
                ContentBlock::ListItem { text: "dot".into(), ordered: false },
            ]
        );
    }

    #[test]
    fn options_toggle_links_images_tables() {
        let config = ExtractionConfig {
            include_links: true,
            include_images: true,
            include_tables: false,
            ..ExtractionConfig::default()
        };
        let payload = extract_from_html(PAGE, "https://example.com/a", &config);
        assert!(texts(&payload.blocks)
            .contains(&"First [paragraph](https://example.com/docs) <here>.".to_string()));
        assert!(payload.blocks.contains(&ContentBlock::Image {
            src: "https://example.com/logo.png".into(),
            alt: "Logo".into()
        }));
        assert!(!payload
            .blocks
            .iter()
            .any(|b| matches!(b, ContentBlock::Table { .. })));
    }

    #[test]
    fn metadata_is_read_from_head() {
        let payload = extract_from_html(PAGE, "https://example.com/a", &ExtractionConfig::default());
        let meta = payload.metadata;
        assert_eq!(meta.title.as_deref(), Some("Real Title"));
        assert_eq!(meta.author.as_deref(), Some("Ada"));
        assert_eq!(meta.language.as_deref(), Some("en-US"));
        assert_eq!(meta.hostname.as_deref(), Some("example.com"));
        assert_eq!(meta.tags, vec!["rust", "async"]);
    }

    #[test]
    fn favor_precision_needs_a_content_container() {
        let config = ExtractionConfig {
            favor_precision: true,
            ..ExtractionConfig::default()
        };
        let payload = extract_from_html(PAGE, "https://example.com/a", &config);
        assert!(payload.blocks.is_empty());
    }

    #[test]
    fn entities_are_decoded() {
        let payload = extract_from_html(
            "<body><p>a &amp; b &#65;&#x42;</p></body>",
            "https://example.com/",
            &ExtractionConfig::default(),
        );
        assert_eq!(texts(&payload.blocks), vec!["a & b AB"]);
    }
}
