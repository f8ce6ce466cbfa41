//! 数学公式处理服务 - 业务能力层
//!
//! 在页面中把 KaTeX / MathJax / MathML 渲染结果替换为 TeX 文本，
//! 之后的正文提取就能直接拿到 `$...$` / `$$...$$`

use std::sync::LazyLock;
use std::time::Duration;

use regex::RegexSet;
use serde::Deserialize;
use tracing::debug;

use crate::error::JobError;
use crate::infrastructure::JsExecutor;

/// 等待公式渲染的时间
const MATH_WAIT: Duration = Duration::from_secs(5);

const MATH_SELECTOR: &str = "mjx-container, .katex, math, script[type^='math/tex'], .MathJax";

const NORMALIZE_SCRIPT: &str = r#"
(() => {
    let processed = 0;
    const TEX = 'annotation[encoding="application/x-tex"]';
    const replace = (el, tex, display) => {
        if (!el || !el.isConnected || !tex || !tex.trim()) return;
        const span = document.createElement('span');
        const body = tex.trim();
        span.textContent = display ? '$$' + body + '$$' : '$' + body + '$';
        el.replaceWith(span);
        processed++;
    };

    document.querySelectorAll('.katex').forEach(el => {
        const annotation = el.querySelector(TEX);
        const block = el.closest('.katex-display');
        if (annotation) replace(block || el, annotation.textContent, !!block);
    });

    document.querySelectorAll('script[type^="math/tex"]').forEach(script => {
        const display = /mode=display/.test(script.type);
        const preview = script.previousElementSibling;
        if (preview && /MathJax/.test(preview.className)) preview.remove();
        replace(script, script.textContent, display);
    });

    document.querySelectorAll('mjx-container').forEach(el => {
        const annotation = el.querySelector(TEX);
        const tex = annotation ? annotation.textContent : el.getAttribute('aria-label');
        replace(el, tex, el.getAttribute('display') === 'true');
    });

    document.querySelectorAll('math').forEach(math => {
        const annotation = math.querySelector(TEX);
        const tex = annotation ? annotation.textContent : math.getAttribute('alttext');
        replace(math.closest('.mwe-math-element') || math, tex, math.getAttribute('display') === 'block');
    });

    return {
        processed,
        remaining: document.querySelectorAll('math, mjx-container, .katex').length
    };
})()
"#;

/// 常见公式标记
static MATH_INDICATORS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r#"(?i)class="katex"#,
        r"(?i)katex\.min\.(css|js)",
        r"(?i)mathjax",
        r#"(?i)type="math/tex"#,
        r"(?i)<math[>\s]",
        r#"(?i)class="mwe-math"#,
        r"\\begin\{equation",
        r"\\frac\{",
    ])
    .expect("math indicator regexes are valid")
});

/// 公式处理统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MathStats {
    /// 已转换为 TeX 的公式数
    pub processed: usize,
    /// 未能转换的公式元素数
    pub remaining: usize,
}

/// 数学公式处理服务
#[derive(Debug, Default)]
pub struct MathNormalizer;

impl MathNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 把页面中的公式替换为 TeX
    pub async fn normalize(&self, executor: &JsExecutor) -> Result<MathStats, JobError> {
        // 页面没有公式时等待会超时，直接继续
        if executor
            .wait_for_selector_within(MATH_SELECTOR, MATH_WAIT)
            .await
            .is_err()
        {
            debug!("页面中未发现公式元素");
            return Ok(MathStats::default());
        }

        let stats: MathStats = executor.eval_as(NORMALIZE_SCRIPT).await?;
        debug!(
            "公式转换完成: 成功 {}, 剩余 {}",
            stats.processed, stats.remaining
        );
        Ok(stats)
    }
}

/// HTML 中是否可能包含数学公式
pub fn contains_math_markup(html: &str) -> bool {
    MATH_INDICATORS.is_match(html)
}
