//! 程序配置
//!
//! 加载顺序：默认值 → TOML 配置文件（`STRONGBIRD_CONFIG`）→ 环境变量。
//! 一次调用只构造一次，之后只读共享给所有任务。

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::OutputFormat;

/// 并发数上限
pub const MAX_WORKERS: usize = 10;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的 URL 数量（页面池大小），取值 [1, 10]
    pub max_workers: usize,
    /// 关闭模板识别，`[` `]` `{` `}` 按普通字符处理
    pub ignore_glob: bool,
    /// 单个模板展开数量超过该值时给出警告
    pub expansion_warn_threshold: usize,
    /// 输出目录，未设置时输出到标准输出
    pub output_dir: Option<String>,
    /// 运行日志文件
    pub output_log_file: String,
    /// 失败 URL 记录文件
    pub failed_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub browser: BrowserSettings,
    pub extraction: ExtractionConfig,
}

/// 浏览器配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// 是否使用浏览器渲染，关闭时直接 HTTP 抓取
    pub javascript: bool,
    pub headless: bool,
    /// 浏览器可执行文件路径，未设置时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    /// 连接已启动浏览器的调试端口，设置后不再启动新浏览器
    pub debug_port: Option<u16>,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// 单个页面导航与等待的超时（毫秒）
    pub timeout_ms: u64,
}

/// 提取配置
///
/// 对编排层不透明，原样传给每个任务的提取流程
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub output_format: OutputFormat,
    /// 将页面中的数学公式转换为 TeX
    pub process_math: bool,
    pub with_metadata: bool,
    pub include_links: bool,
    pub include_images: bool,
    pub include_tables: bool,
    pub include_comments: bool,
    /// 偏向精确率：只取正文容器，不回退到整个 body
    pub favor_precision: bool,
    /// 目标语言，页面语言不符时视为提取失败
    pub target_lang: Option<String>,
    // --- 页面交互 ---
    pub wait_for_selector: Option<String>,
    pub scroll_to_bottom: bool,
    pub wait_time_ms: u64,
    pub execute_script: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: 1,
            ignore_glob: false,
            expansion_warn_threshold: 1000,
            output_dir: None,
            output_log_file: "strongbird.log".to_string(),
            failed_log_file: "failed.txt".to_string(),
            verbose_logging: false,
            browser: BrowserSettings::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            javascript: true,
            headless: true,
            chrome_executable: None,
            debug_port: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            timeout_ms: 30_000,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Markdown,
            process_math: false,
            with_metadata: true,
            include_links: false,
            include_images: false,
            include_tables: true,
            include_comments: false,
            favor_precision: false,
            target_lang: None,
            wait_for_selector: None,
            scroll_to_bottom: false,
            wait_time_ms: 0,
            execute_script: None,
        }
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载并校验
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("STRONGBIRD_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常为 `std::env::var`，测试中可替换
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        env.parse("STRONGBIRD_MAX_WORKERS", &mut self.max_workers)?;
        env.parse("STRONGBIRD_IGNORE_GLOB", &mut self.ignore_glob)?;
        env.parse(
            "STRONGBIRD_EXPANSION_WARN_THRESHOLD",
            &mut self.expansion_warn_threshold,
        )?;
        env.optional("STRONGBIRD_OUTPUT_DIR", &mut self.output_dir);
        env.string("STRONGBIRD_OUTPUT_LOG_FILE", &mut self.output_log_file);
        env.string("STRONGBIRD_FAILED_LOG_FILE", &mut self.failed_log_file);
        env.parse("STRONGBIRD_VERBOSE", &mut self.verbose_logging)?;

        let browser = &mut self.browser;
        env.parse("STRONGBIRD_JAVASCRIPT", &mut browser.javascript)?;
        env.parse("STRONGBIRD_HEADLESS", &mut browser.headless)?;
        env.optional("STRONGBIRD_CHROME_EXECUTABLE", &mut browser.chrome_executable);
        if let Some(raw) = (env.lookup)("STRONGBIRD_BROWSER_DEBUG_PORT") {
            browser.debug_port = Some(parse_value("STRONGBIRD_BROWSER_DEBUG_PORT", &raw)?);
        }
        env.string("STRONGBIRD_USER_AGENT", &mut browser.user_agent);
        if let Some(raw) = (env.lookup)("STRONGBIRD_VIEWPORT") {
            let (width, height) =
                parse_viewport(&raw).ok_or_else(|| ConfigError::EnvVarParseFailed {
                    var_name: "STRONGBIRD_VIEWPORT".to_string(),
                    value: raw.clone(),
                    expected_type: "<宽>x<高>".to_string(),
                })?;
            browser.viewport_width = width;
            browser.viewport_height = height;
        }
        env.parse("STRONGBIRD_TIMEOUT_MS", &mut browser.timeout_ms)?;

        let extraction = &mut self.extraction;
        if let Some(raw) = (env.lookup)("STRONGBIRD_FORMAT") {
            extraction.output_format = OutputFormat::from_name(&raw)
                .ok_or(ConfigError::UnknownFormat { value: raw })?;
        }
        env.parse("STRONGBIRD_PROCESS_MATH", &mut extraction.process_math)?;
        env.parse("STRONGBIRD_WITH_METADATA", &mut extraction.with_metadata)?;
        env.parse("STRONGBIRD_INCLUDE_LINKS", &mut extraction.include_links)?;
        env.parse("STRONGBIRD_INCLUDE_IMAGES", &mut extraction.include_images)?;
        env.parse("STRONGBIRD_INCLUDE_TABLES", &mut extraction.include_tables)?;
        env.parse("STRONGBIRD_INCLUDE_COMMENTS", &mut extraction.include_comments)?;
        env.parse("STRONGBIRD_FAVOR_PRECISION", &mut extraction.favor_precision)?;
        env.optional("STRONGBIRD_TARGET_LANG", &mut extraction.target_lang);
        env.optional("STRONGBIRD_WAIT_FOR", &mut extraction.wait_for_selector);
        env.parse("STRONGBIRD_SCROLL", &mut extraction.scroll_to_bottom)?;
        env.parse("STRONGBIRD_WAIT_TIME_MS", &mut extraction.wait_time_ms)?;
        env.optional("STRONGBIRD_EXECUTE_SCRIPT", &mut extraction.execute_script);

        Ok(self)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WORKERS).contains(&self.max_workers) {
            return Err(ConfigError::WorkerCountOutOfRange {
                value: self.max_workers,
            });
        }
        Ok(())
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn parse<T: FromStr>(&self, name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(raw) = (self.lookup)(name) {
            *target = parse_value(name, &raw)?;
        }
        Ok(())
    }

    fn string(&self, name: &str, target: &mut String) {
        if let Some(raw) = (self.lookup)(name) {
            *target = raw;
        }
    }

    /// 空字符串视为未设置
    fn optional(&self, name: &str, target: &mut Option<String>) {
        if let Some(raw) = (self.lookup)(name) {
            *target = Some(raw).filter(|v| !v.trim().is_empty());
        }
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: name.to_string(),
            value: raw.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        })
}

/// 解析 `1920x1080` 形式的视口大小
fn parse_viewport(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}
