use phf::phf_map;
use serde::{Deserialize, Deserializer, Serialize};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown，元数据作为 front matter
    #[default]
    Markdown,
    /// 纯文本，元数据作为标题块
    Text,
    /// JSON，内容与元数据一起序列化
    Json,
}

/// 格式名称及别名
static FORMAT_ALIASES: phf::Map<&'static str, OutputFormat> = phf_map! {
    "markdown" => OutputFormat::Markdown,
    "md" => OutputFormat::Markdown,
    "text" => OutputFormat::Text,
    "txt" => OutputFormat::Text,
    "json" => OutputFormat::Json,
};

impl OutputFormat {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    /// 输出文件扩展名
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }

    /// 从名称或别名解析（忽略大小写）
    pub fn from_name(s: &str) -> Option<Self> {
        FORMAT_ALIASES.get(s.trim().to_lowercase().as_str()).copied()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        OutputFormat::from_name(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("未知的输出格式: {}", raw)))
    }
}
