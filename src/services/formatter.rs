//! 输出格式化服务 - 业务能力层
//!
//! 把 [`ExtractedContent`] 渲染为 Markdown / 纯文本 / JSON

use std::fmt::Write as _;

use crate::models::{ContentBlock, ExtractedContent, OutputFormat, PageMetadata};

/// 渲染单个提取结果
pub fn format_content(
    content: &ExtractedContent,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Markdown => Ok(to_markdown(content)),
        OutputFormat::Text => Ok(to_text(content)),
        OutputFormat::Json => serde_json::to_string_pretty(content),
    }
}

fn to_markdown(content: &ExtractedContent) -> String {
    let mut out = String::new();

    if let Some(meta) = &content.metadata {
        out.push_str("---\n");
        for (key, value) in metadata_fields(meta, content) {
            let _ = writeln!(out, "{}: {}", key, yaml_quote(&value));
        }
        if !meta.categories.is_empty() {
            let _ = writeln!(out, "categories: [{}]", quoted_list(&meta.categories));
        }
        if !meta.tags.is_empty() {
            let _ = writeln!(out, "tags: [{}]", quoted_list(&meta.tags));
        }
        out.push_str("---\n\n");
    }

    let mut ordered_index = 0;
    for block in &content.blocks {
        match block {
            ContentBlock::ListItem { ordered: true, .. } => ordered_index += 1,
            _ => ordered_index = 0,
        }
        match block {
            ContentBlock::Heading { level, text } => {
                let _ = writeln!(out, "{} {}\n", "#".repeat((*level).clamp(1, 6) as usize), text);
            }
            ContentBlock::Paragraph { text } => {
                let _ = writeln!(out, "{}\n", text);
            }
            ContentBlock::ListItem { text, ordered } => {
                if *ordered {
                    let _ = writeln!(out, "{}. {}", ordered_index, text);
                } else {
                    let _ = writeln!(out, "- {}", text);
                }
            }
            ContentBlock::Quote { text } => {
                let _ = writeln!(out, "> {}\n", text);
            }
            ContentBlock::Code { text } => {
                let _ = writeln!(out, "```\n{}\n```\n", text);
            }
            ContentBlock::Table { rows } => {
                out.push_str(&markdown_table(rows));
                out.push('\n');
            }
            ContentBlock::Image { src, alt } => {
                let _ = writeln!(out, "![{}]({})\n", alt, src);
            }
        }
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

fn to_text(content: &ExtractedContent) -> String {
    let mut out = String::new();

    if let Some(meta) = &content.metadata {
        let banner = "=".repeat(60);
        let _ = writeln!(out, "{}", banner);
        for (key, value) in metadata_fields(meta, content) {
            let _ = writeln!(out, "{}: {}", capitalize(key), value);
        }
        let _ = writeln!(out, "{}\n", banner);
    }

    for block in &content.blocks {
        match block {
            ContentBlock::Heading { text, .. }
            | ContentBlock::Paragraph { text }
            | ContentBlock::Quote { text }
            | ContentBlock::Code { text } => {
                let _ = writeln!(out, "{}\n", text);
            }
            ContentBlock::ListItem { text, .. } => {
                let _ = writeln!(out, "* {}", text);
            }
            ContentBlock::Table { rows } => {
                for row in rows {
                    let _ = writeln!(out, "{}", row.join("\t"));
                }
                out.push('\n');
            }
            ContentBlock::Image { alt, .. } if !alt.is_empty() => {
                let _ = writeln!(out, "[{}]\n", alt);
            }
            ContentBlock::Image { .. } => {}
        }
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// 元数据中的单值字段，url 总是包含在内
fn metadata_fields<'a>(
    meta: &'a PageMetadata,
    content: &'a ExtractedContent,
) -> Vec<(&'static str, String)> {
    let url = content.final_url.as_deref().unwrap_or(&content.url);
    [
        ("title", meta.title.as_deref()),
        ("author", meta.author.as_deref()),
        ("date", meta.date.as_deref()),
        ("description", meta.description.as_deref()),
        ("sitename", meta.sitename.as_deref()),
        ("hostname", meta.hostname.as_deref()),
        ("language", meta.language.as_deref()),
        ("url", Some(url)),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, v.to_string())))
    .collect()
}

fn markdown_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = (0..columns)
            .map(|c| row.get(c).map_or(String::new(), |cell| cell.replace('|', "\\|")))
            .collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
        if i == 0 {
            let _ = writeln!(out, "|{}", " --- |".repeat(columns));
        }
    }
    out
}

fn yaml_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| yaml_quote(v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(with_metadata: bool) -> ExtractedContent {
        ExtractedContent {
            url: "https://example.com/post".into(),
            final_url: None,
            blocks: vec![
                ContentBlock::Heading {
                    level: 2,
                    text: "Intro".into(),
                },
                ContentBlock::Paragraph {
                    text: "Body with $x^2$".into(),
                },
                ContentBlock::ListItem {
                    text: "first".into(),
                    ordered: true,
                },
                ContentBlock::ListItem {
                    text: "second".into(),
                    ordered: true,
                },
                ContentBlock::Table {
                    rows: vec![vec!["a".into(), "b".into()], vec!["1".into()]],
                },
            ],
            metadata: with_metadata.then(|| PageMetadata {
                title: Some("Say \"hi\"".into()),
                tags: vec!["rust".into()],
                ..PageMetadata::default()
            }),
            math_count: 1,
        }
    }

    #[test]
    fn markdown_has_front_matter_and_blocks() {
        let md = format_content(&sample(true), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("---\ntitle: \"Say \\\"hi\\\"\"\nurl: \"https://example.com/post\"\n"));
        assert!(md.contains("tags: [\"rust\"]\n---\n\n## Intro\n\nBody with $x^2$\n"));
        assert!(md.contains("1. first\n2. second\n"));
        assert!(md.contains("| a | b |\n| --- | --- |\n| 1 |  |\n"));
    }

    #[test]
    fn markdown_without_metadata_has_no_front_matter() {
        let md = format_content(&sample(false), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("## Intro"));
    }

    #[test]
    fn text_has_banner() {
        let text = format_content(&sample(true), OutputFormat::Text).unwrap();
        assert!(text.starts_with(&"=".repeat(60)));
        assert!(text.contains("Title: Say \"hi\"\n"));
        assert!(text.contains("Intro\n\nBody with $x^2$\n"));
        assert!(text.contains("* first\n"));
    }

    #[test]
    fn json_is_structured() {
        let json = format_content(&sample(false), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["url"], "https://example.com/post");
        assert_eq!(value["blocks"][0]["type"], "heading");
        assert_eq!(value["math_count"], 1);
    }
}
