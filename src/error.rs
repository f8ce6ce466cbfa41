//! 错误类型定义
//!
//! 按照影响范围划分：
//! - `PatternError`：单个模板的语法错误，只影响该模板
//! - `SourceReadError`：批量文件读取失败，整个调用终止
//! - `JobError`：单个任务的执行失败，记录到报告中，不影响其他任务
//! - `ConfigError`：配置错误，启动阶段即终止

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// URL 模板语法错误
    #[error("模板语法错误 ({template}): {source}")]
    Pattern {
        template: String,
        #[source]
        source: PatternError,
    },
    /// 批量文件读取错误
    #[error(transparent)]
    Source(#[from] SourceReadError),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// 浏览器相关错误
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// 单个任务执行错误
    #[error(transparent)]
    Job(#[from] JobError),
    /// 展开后没有任何可处理的 URL
    #[error("没有可处理的 URL")]
    NoJobs,
}

/// 模板语法错误（PatternSyntaxError）
///
/// `position` 为模板中出错片段的起始字节偏移
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// 范围起点大于终点
    #[error("位置 {position}: 范围起点大于终点 ({start} > {end})")]
    InvertedRange {
        position: usize,
        start: String,
        end: String,
    },
    /// 字母范围两端大小写不一致
    #[error("位置 {position}: 字母范围大小写不一致 ({start}-{end})")]
    CaseMismatch {
        position: usize,
        start: char,
        end: char,
    },
    /// 范围两端一个是数字一个是字母
    #[error("位置 {position}: 范围两端类型不一致 ({start}-{end})")]
    MixedBounds {
        position: usize,
        start: String,
        end: String,
    },
    /// 步长不是正整数
    #[error("位置 {position}: 步长必须为正整数, 实际为 {step}")]
    NonPositiveStep { position: usize, step: String },
    /// 字母范围带了步长，如 `[a-z:2]`
    #[error("位置 {position}: 字母范围不支持步长")]
    AlphaStep { position: usize },
    /// 数字超出可表示范围
    #[error("位置 {position}: 数字超出范围: {value}")]
    NumberOverflow { position: usize, value: String },
    /// `[` 或 `{` 没有闭合
    #[error("位置 {position}: 未闭合的 '{delimiter}'")]
    Unterminated { position: usize, delimiter: char },
    /// `{}` 中没有任何项
    #[error("位置 {position}: 列表为空")]
    EmptyList { position: usize },
    /// 列表中存在空项，如 `{a,,b}`
    #[error("位置 {position}: 列表包含空项")]
    EmptyItem { position: usize },
    /// 列表项中出现转义的分隔符，如 `{a\,b}`
    #[error("位置 {position}: 列表项中不支持转义的分隔符 '{delimiter}'")]
    EscapedDelimiter { position: usize, delimiter: char },
    /// 列表项中出现嵌套的 `{`
    #[error("位置 {position}: 列表项中不支持嵌套的 '{delimiter}'")]
    NestedDelimiter { position: usize, delimiter: char },
}

impl PatternError {
    /// 出错片段在模板中的起始偏移
    pub fn position(&self) -> usize {
        match self {
            PatternError::InvertedRange { position, .. }
            | PatternError::CaseMismatch { position, .. }
            | PatternError::MixedBounds { position, .. }
            | PatternError::NonPositiveStep { position, .. }
            | PatternError::AlphaStep { position }
            | PatternError::NumberOverflow { position, .. }
            | PatternError::Unterminated { position, .. }
            | PatternError::EmptyList { position }
            | PatternError::EmptyItem { position }
            | PatternError::EscapedDelimiter { position, .. }
            | PatternError::NestedDelimiter { position, .. } => *position,
        }
    }
}

/// 批量文件读取错误
#[derive(Debug, Error)]
pub enum SourceReadError {
    /// 文件不存在
    #[error("批量文件不存在: {}", path.display())]
    NotFound { path: PathBuf },
    /// 路径不是普通文件
    #[error("路径不是文件: {}", path.display())]
    NotAFile { path: PathBuf },
    /// 文件内容不是合法的 UTF-8
    #[error("批量文件不是合法的 UTF-8 文本: {}", path.display())]
    InvalidUtf8 { path: PathBuf },
    /// 其他 IO 错误
    #[error("读取批量文件失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 任务失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// 导航失败（网络错误、DNS 等）
    Navigation,
    /// 超时
    Timeout,
    /// 页面渲染或 CDP 通信失败
    Render,
    /// 页面脚本执行失败
    Script,
    /// HTTP 状态码异常
    Http,
    /// 提取结果为空或无法解析
    EmptyContent,
    /// 资源（页面句柄）不可用
    Resource,
    /// 任务内部 panic
    Panic,
}

impl JobErrorKind {
    /// 分类名称
    pub fn name(self) -> &'static str {
        match self {
            JobErrorKind::Navigation => "navigation",
            JobErrorKind::Timeout => "timeout",
            JobErrorKind::Render => "render",
            JobErrorKind::Script => "script",
            JobErrorKind::Http => "http",
            JobErrorKind::EmptyContent => "empty_content",
            JobErrorKind::Resource => "resource",
            JobErrorKind::Panic => "panic",
        }
    }
}

impl std::fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个任务的执行错误（JobExecutionError）
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("[{kind}] {message}")]
pub struct JobError {
    pub kind: JobErrorKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Navigation, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Timeout, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Render, message)
    }

    pub fn empty_content(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::EmptyContent, message)
    }

    /// 将 CDP 错误归类，超时单独识别，其余使用调用方给出的分类
    pub fn from_cdp(err: chromiumoxide::error::CdpError, fallback: JobErrorKind) -> Self {
        match err {
            chromiumoxide::error::CdpError::Timeout => Self::timeout("浏览器操作超时"),
            other => Self::new(fallback, other.to_string()),
        }
    }
}

impl From<reqwest::Error> for JobError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            JobErrorKind::Timeout
        } else if err.is_status() {
            JobErrorKind::Http
        } else {
            JobErrorKind::Navigation
        };
        Self::new(kind, err.to_string())
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        Self::empty_content(format!("提取结果解析失败: {}", err))
    }
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {message}")]
    ConfigurationFailed { message: String },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 并发数超出 [1, 10]
    #[error("并发数必须在 1 到 10 之间, 实际为 {value}")]
    WorkerCountOutOfRange { value: usize },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 未知的输出格式
    #[error("未知的输出格式: {value}")]
    UnknownFormat { value: String },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("TOML解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建模板语法错误
    pub fn pattern(template: impl Into<String>, source: PatternError) -> Self {
        AppError::Pattern {
            template: template.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_reports_position() {
        let err = PatternError::Unterminated {
            position: 7,
            delimiter: '[',
        };
        assert_eq!(err.position(), 7);
    }

    #[test]
    fn job_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&JobErrorKind::EmptyContent).unwrap();
        assert_eq!(json, "\"empty_content\"");
    }

    #[test]
    fn app_error_wraps_pattern_error_as_source() {
        use std::error::Error as _;
        let err = AppError::pattern(
            "http://x/[3-1]",
            PatternError::InvertedRange {
                position: 9,
                start: "3".into(),
                end: "1".into(),
            },
        );
        assert!(err.source().is_some());
    }
}
