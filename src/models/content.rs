//! 提取结果的数据结构
//!
//! 浏览器端脚本与 HTTP 提取都产出同样的结构，由格式化服务渲染为最终输出

use serde::{Deserialize, Serialize};

/// 页面元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        *self == PageMetadata::default()
    }
}

/// 正文中的一个块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    ListItem {
        text: String,
        #[serde(default)]
        ordered: bool,
    },
    Quote { text: String },
    Code { text: String },
    Table { rows: Vec<Vec<String>> },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
    },
}

/// 单个 URL 的提取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// 请求的 URL
    pub url: String,
    /// 跳转后的最终 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMetadata>,
    /// 转换为 TeX 的公式数量
    #[serde(default)]
    pub math_count: usize,
}

impl ExtractedContent {
    /// 是否没有任何正文
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|block| match block {
            ContentBlock::Heading { text, .. }
            | ContentBlock::Paragraph { text }
            | ContentBlock::ListItem { text, .. }
            | ContentBlock::Quote { text }
            | ContentBlock::Code { text } => text.trim().is_empty(),
            ContentBlock::Table { rows } => rows.is_empty(),
            ContentBlock::Image { src, .. } => src.is_empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_deserialize_from_tagged_json() {
        let json = r#"{
            "url": "https://example.com",
            "blocks": [
                {"type": "heading", "level": 1, "text": "Title"},
                {"type": "list_item", "text": "one"},
                {"type": "image", "src": "a.png"}
            ],
            "metadata": {"title": "Title", "tags": ["x"]}
        }"#;
        let content: ExtractedContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.blocks.len(), 3);
        assert_eq!(
            content.blocks[1],
            ContentBlock::ListItem {
                text: "one".into(),
                ordered: false
            }
        );
        assert_eq!(content.metadata.unwrap().tags, vec!["x"]);
        assert_eq!(content.math_count, 0);
    }

    #[test]
    fn whitespace_only_content_is_blank() {
        let content = ExtractedContent {
            url: "https://example.com".into(),
            final_url: None,
            blocks: vec![ContentBlock::Paragraph { text: "  \n".into() }],
            metadata: None,
            math_count: 0,
        };
        assert!(content.is_blank());
    }
}
