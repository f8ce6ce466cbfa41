//! 页面内提取脚本
//!
//! 在浏览器中遍历正文容器，把 DOM 转换为 [`ContentBlock`] 列表并读取元数据。
//! 提取选项以 JSON 形式注入脚本。

use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::models::{ContentBlock, PageMetadata};

const OPTIONS_PLACEHOLDER: &str = "__STRONGBIRD_OPTIONS__";

const EXTRACT_SCRIPT: &str = r#"
((opts) => {
    const clean = (s) => (s || '').replace(/\s+/g, ' ').trim();
    const text = (el) => clean(el.innerText || el.textContent);
    const meta = (selector) => {
        const el = document.querySelector(selector);
        const value = el ? clean(el.getAttribute('content')) : '';
        return value || null;
    };
    const metaAll = (selector) =>
        [...document.querySelectorAll(selector)].map(m => clean(m.getAttribute('content'))).filter(Boolean);
    const timeEl = document.querySelector('time[datetime]');

    const metadata = {
        title: meta('meta[property="og:title"]') || clean(document.title) || null,
        author: meta('meta[name="author"]') || meta('meta[property="article:author"]'),
        date: meta('meta[property="article:published_time"]') || meta('meta[name="date"]')
            || (timeEl ? clean(timeEl.getAttribute('datetime')) || null : null),
        description: meta('meta[name="description"]') || meta('meta[property="og:description"]'),
        sitename: meta('meta[property="og:site_name"]'),
        hostname: location.hostname || null,
        language: clean(document.documentElement.getAttribute('lang')) || null,
        categories: metaAll('meta[property="article:section"]'),
        tags: metaAll('meta[property="article:tag"]'),
    };

    const candidates = ['article', 'main', '[role="main"]', '#content', '.entry-content', '.post-content', '.content'];
    let root = null;
    for (const selector of candidates) {
        const el = document.querySelector(selector);
        if (el && text(el).length >= 200) { root = el; break; }
    }
    if (!root && !opts.favor_precision) root = document.body;

    const blocks = [];
    const result = { blocks, metadata, final_url: location.href };
    if (!root) return result;

    const SKIP = 'script, style, noscript, template, nav, header, footer, aside, form, button, iframe, svg';
    const isComment = (el) => /comment/i.test((el.id || '') + ' ' + (typeof el.className === 'string' ? el.className : ''));

    const inline = (el) => {
        if (!opts.include_links) return text(el);
        let out = '';
        el.childNodes.forEach(node => {
            if (node.nodeType === Node.TEXT_NODE) {
                out += node.textContent;
            } else if (node.nodeType === Node.ELEMENT_NODE) {
                if (node.tagName === 'A' && node.getAttribute('href')) {
                    out += '[' + text(node) + '](' + node.href + ')';
                } else {
                    out += inline(node);
                }
            }
        });
        return clean(out);
    };

    const push = (block, value) => { if (value) blocks.push({ ...block, text: value }); };

    const walk = (el) => {
        for (const child of el.children) {
            if (child.matches(SKIP)) continue;
            if (!opts.include_comments && isComment(child)) continue;
            const tag = child.tagName;
            if (/^H[1-6]$/.test(tag)) {
                push({ type: 'heading', level: Number(tag[1]) }, text(child));
            } else if (tag === 'P') {
                push({ type: 'paragraph' }, inline(child));
            } else if (tag === 'UL' || tag === 'OL') {
                for (const li of child.querySelectorAll(':scope > li')) {
                    push({ type: 'list_item', ordered: tag === 'OL' }, inline(li));
                }
            } else if (tag === 'BLOCKQUOTE') {
                push({ type: 'quote' }, inline(child));
            } else if (tag === 'PRE') {
                const code = (child.textContent || '').replace(/\s+$/, '');
                if (code.trim()) blocks.push({ type: 'code', text: code });
            } else if (tag === 'TABLE') {
                if (!opts.include_tables) continue;
                const rows = [...child.querySelectorAll('tr')]
                    .map(tr => [...tr.querySelectorAll('th, td')].map(text))
                    .filter(row => row.length > 0);
                if (rows.length) blocks.push({ type: 'table', rows });
            } else if (tag === 'IMG') {
                if (opts.include_images && child.src) {
                    blocks.push({ type: 'image', src: child.src, alt: child.alt || '' });
                }
            } else {
                walk(child);
            }
        }
    };
    walk(root);

    if (!blocks.length) push({ type: 'paragraph' }, text(root));
    return result;
})(__STRONGBIRD_OPTIONS__)
"#;

/// 注入脚本的提取选项
#[derive(Debug, Clone, Serialize)]
struct ScriptOptions {
    include_links: bool,
    include_images: bool,
    include_tables: bool,
    include_comments: bool,
    favor_precision: bool,
}

impl From<&ExtractionConfig> for ScriptOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            include_links: config.include_links,
            include_images: config.include_images,
            include_tables: config.include_tables,
            include_comments: config.include_comments,
            favor_precision: config.favor_precision,
        }
    }
}

/// 脚本返回的数据
#[derive(Debug, Clone, Deserialize)]
pub struct PagePayload {
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub metadata: PageMetadata,
    #[serde(default)]
    pub final_url: Option<String>,
}

/// 生成带选项的提取脚本
pub fn build_extract_script(config: &ExtractionConfig) -> String {
    // 只包含 bool 字段，序列化不会失败
    let options = serde_json::to_string(&ScriptOptions::from(config))
        .unwrap_or_else(|_| String::from("{}"));
    EXTRACT_SCRIPT.replace(OPTIONS_PLACEHOLDER, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_injected() {
        let config = ExtractionConfig {
            include_links: true,
            favor_precision: true,
            ..ExtractionConfig::default()
        };
        let script = build_extract_script(&config);
        assert!(!script.contains(OPTIONS_PLACEHOLDER));
        assert!(script.contains(r#""include_links":true"#));
        assert!(script.contains(r#""favor_precision":true"#));
        assert!(script.contains(r#""include_tables":true"#));
    }

    #[test]
    fn payload_tolerates_missing_fields() {
        let payload: PagePayload = serde_json::from_str(
            r#"{"blocks": [{"type": "paragraph", "text": "hi"}],
                "metadata": {"title": null, "language": "en", "categories": [], "tags": []}}"#,
        )
        .unwrap();
        assert_eq!(payload.blocks.len(), 1);
        assert_eq!(payload.metadata.language.as_deref(), Some("en"));
        assert!(payload.final_url.is_none());
    }
}
