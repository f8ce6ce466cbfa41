//! curl 风格的模板解析器
//!
//! 从左到右扫描模板，识别以下语法：
//! - `[<数字>-<数字>]`、`[<数字>-<数字>:<步长>]`
//! - `[<字母>-<字母>]`（大小写一致）
//! - `{<项>,<项>,...}`
//!
//! 方括号内不是范围形状的内容（如 IPv6 地址 `[::1]`）按字面量处理

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PatternError;
use crate::glob::pattern::{Pattern, PatternKind, Span};

/// 形如 `<数字或单字母>-<数字或单字母>[:<步长>]` 的方括号内容
static RANGE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+|[A-Za-z])-([0-9]+|[A-Za-z])(?::(-?[0-9]+))?$")
        .expect("range regex is valid")
});

/// 解析后的模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    source: String,
    patterns: Vec<Pattern>,
}

impl ParsedTemplate {
    /// 不做任何识别，整个模板作为一个字面量
    pub fn verbatim(template: &str) -> Self {
        let patterns = if template.is_empty() {
            Vec::new()
        } else {
            vec![Pattern::literal(template, Span::new(0, template.len()))]
        };
        Self {
            source: template.to_string(),
            patterns,
        }
    }

    /// 原始模板
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 按位置排序的片段列表
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// 是否包含可展开的片段
    pub fn is_expandable(&self) -> bool {
        self.patterns.iter().any(Pattern::is_expandable)
    }

    /// 展开后的 URL 数量，溢出时返回 `None`
    pub fn combination_count(&self) -> Option<usize> {
        self.patterns
            .iter()
            .try_fold(1usize, |acc, p| acc.checked_mul(p.domain_len()))
    }
}

/// 模板解析入口，`ignore_glob` 为真时跳过识别
pub fn compile(template: &str, ignore_glob: bool) -> Result<ParsedTemplate, PatternError> {
    if ignore_glob {
        Ok(ParsedTemplate::verbatim(template))
    } else {
        parse_template(template)
    }
}

/// 解析模板
pub fn parse_template(template: &str) -> Result<ParsedTemplate, PatternError> {
    let bytes = template.as_bytes();
    let mut patterns = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    // 分隔符均为 ASCII，按字节扫描不会切断多字节字符
    while pos < bytes.len() {
        match bytes[pos] {
            b'[' => {
                let close = template[pos + 1..]
                    .find(']')
                    .map(|offset| pos + 1 + offset)
                    .ok_or(PatternError::Unterminated {
                        position: pos,
                        delimiter: '[',
                    })?;
                let inner = &template[pos + 1..close];
                if inner.contains('[') {
                    // 外层 `[` 作为字面量，内层交给后续扫描
                    pos += 1;
                    continue;
                }
                match parse_range(inner, pos)? {
                    Some(kind) => {
                        push_literal(&mut patterns, template, literal_start, pos);
                        patterns.push(Pattern {
                            kind,
                            span: Span::new(pos, close + 1),
                        });
                        pos = close + 1;
                        literal_start = pos;
                    }
                    // 不是范围：只有 `[` 作为字面量，继续扫描括号内部
                    None => pos += 1,
                }
            }
            b'{' => {
                let (items, close) = parse_list(template, pos)?;
                push_literal(&mut patterns, template, literal_start, pos);
                patterns.push(Pattern {
                    kind: PatternKind::List { items },
                    span: Span::new(pos, close + 1),
                });
                pos = close + 1;
                literal_start = pos;
            }
            _ => pos += 1,
        }
    }
    push_literal(&mut patterns, template, literal_start, bytes.len());

    Ok(ParsedTemplate {
        source: template.to_string(),
        patterns,
    })
}

fn push_literal(patterns: &mut Vec<Pattern>, template: &str, start: usize, end: usize) {
    if start < end {
        patterns.push(Pattern::literal(&template[start..end], Span::new(start, end)));
    }
}

/// 解析方括号内容，不是范围形状时返回 `None`
fn parse_range(inner: &str, position: usize) -> Result<Option<PatternKind>, PatternError> {
    let Some(caps) = RANGE_SHAPE.captures(inner) else {
        return Ok(None);
    };
    let lo = &caps[1];
    let hi = &caps[2];
    let step = caps.get(3).map(|m| m.as_str());

    let lo_numeric = lo.as_bytes()[0].is_ascii_digit();
    let hi_numeric = hi.as_bytes()[0].is_ascii_digit();

    match (lo_numeric, hi_numeric) {
        (true, true) => parse_numeric_range(lo, hi, step, position).map(Some),
        (false, false) => {
            if step.is_some() {
                return Err(PatternError::AlphaStep { position });
            }
            parse_alpha_range(lo, hi, position).map(Some)
        }
        _ => Err(PatternError::MixedBounds {
            position,
            start: lo.to_string(),
            end: hi.to_string(),
        }),
    }
}

fn parse_numeric_range(
    lo: &str,
    hi: &str,
    step: Option<&str>,
    position: usize,
) -> Result<PatternKind, PatternError> {
    let start = parse_number(lo, position)?;
    let end = parse_number(hi, position)?;
    if start > end {
        return Err(PatternError::InvertedRange {
            position,
            start: lo.to_string(),
            end: hi.to_string(),
        });
    }

    let step = match step {
        None => 1,
        Some(raw) if raw.starts_with('-') => {
            return Err(PatternError::NonPositiveStep {
                position,
                step: raw.to_string(),
            })
        }
        Some(raw) => {
            let value = parse_number(raw, position)?;
            if value == 0 {
                return Err(PatternError::NonPositiveStep {
                    position,
                    step: raw.to_string(),
                });
            }
            value
        }
    };

    // 任一端带前导零时按较长一端的位数补零，否则不补零
    let padded = [lo, hi].iter().any(|b| b.len() > 1 && b.starts_with('0'));
    let width = if padded { lo.len().max(hi.len()) } else { 0 };

    Ok(PatternKind::NumericRange {
        start,
        end,
        step,
        width,
    })
}

fn parse_number(raw: &str, position: usize) -> Result<u64, PatternError> {
    raw.parse().map_err(|_| PatternError::NumberOverflow {
        position,
        value: raw.to_string(),
    })
}

fn parse_alpha_range(lo: &str, hi: &str, position: usize) -> Result<PatternKind, PatternError> {
    // 正则已保证两端都是单个 ASCII 字母
    let start = lo.chars().next().unwrap_or_default();
    let end = hi.chars().next().unwrap_or_default();

    if start.is_ascii_lowercase() != end.is_ascii_lowercase() {
        return Err(PatternError::CaseMismatch {
            position,
            start,
            end,
        });
    }
    if start > end {
        return Err(PatternError::InvertedRange {
            position,
            start: lo.to_string(),
            end: hi.to_string(),
        });
    }
    Ok(PatternKind::AlphaRange { start, end })
}

/// 解析 `{...}`，返回各项与右花括号的位置
fn parse_list(template: &str, open: usize) -> Result<(Vec<String>, usize), PatternError> {
    let bytes = template.as_bytes();
    let mut items = Vec::new();
    let mut item_start = open + 1;
    let mut pos = open + 1;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                if let Some(&(next @ (b',' | b'{' | b'}'))) = bytes.get(pos + 1) {
                    return Err(PatternError::EscapedDelimiter {
                        position: pos,
                        delimiter: next as char,
                    });
                }
            }
            b'{' => {
                return Err(PatternError::NestedDelimiter {
                    position: pos,
                    delimiter: '{',
                })
            }
            b',' => {
                items.push(take_item(template, item_start, pos)?);
                item_start = pos + 1;
            }
            b'}' => {
                if items.is_empty() && template[item_start..pos].trim().is_empty() {
                    return Err(PatternError::EmptyList { position: open });
                }
                items.push(take_item(template, item_start, pos)?);
                return Ok((items, pos));
            }
            _ => {}
        }
        pos += 1;
    }

    Err(PatternError::Unterminated {
        position: open,
        delimiter: '{',
    })
}

fn take_item(template: &str, start: usize, end: usize) -> Result<String, PatternError> {
    let item = template[start..end].trim();
    if item.is_empty() {
        return Err(PatternError::EmptyItem { position: start });
    }
    Ok(item.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(template: &str) -> Vec<PatternKind> {
        parse_template(template)
            .unwrap()
            .patterns()
            .iter()
            .map(|p| p.kind.clone())
            .collect()
    }

    #[test]
    fn numeric_range_without_padding() {
        let parsed = parse_template("http://example.com/page-[1-10]").unwrap();
        let range = &parsed.patterns()[1];
        assert_eq!(
            range.kind,
            PatternKind::NumericRange {
                start: 1,
                end: 10,
                step: 1,
                width: 0
            }
        );
        assert_eq!(range.span, Span::new(24, 30));
    }

    #[test]
    fn numeric_range_with_leading_zeros_pads() {
        assert_eq!(
            kinds("[001-010]"),
            vec![PatternKind::NumericRange {
                start: 1,
                end: 10,
                step: 1,
                width: 3
            }]
        );
    }

    #[test]
    fn numeric_range_with_step() {
        assert_eq!(
            kinds("[0-10:2]"),
            vec![PatternKind::NumericRange {
                start: 0,
                end: 10,
                step: 2,
                width: 0
            }]
        );
    }

    #[test]
    fn alpha_ranges_both_cases() {
        assert_eq!(
            kinds("[a-e]"),
            vec![PatternKind::AlphaRange {
                start: 'a',
                end: 'e'
            }]
        );
        assert_eq!(
            kinds("[A-E]"),
            vec![PatternKind::AlphaRange {
                start: 'A',
                end: 'E'
            }]
        );
    }

    #[test]
    fn list_keeps_order_and_duplicates() {
        assert_eq!(
            kinds("{one,two,one}"),
            vec![PatternKind::List {
                items: vec!["one".into(), "two".into(), "one".into()]
            }]
        );
    }

    #[test]
    fn spans_partition_the_template() {
        let template = "http://x.com/{a,b}/p[1-3].html";
        let parsed = parse_template(template).unwrap();
        let mut cursor = 0;
        for p in parsed.patterns() {
            assert_eq!(p.span.start, cursor);
            cursor = p.span.end;
        }
        assert_eq!(cursor, template.len());
        assert_eq!(parsed.patterns().len(), 5);
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        assert!(matches!(
            parse_template("x[10-1]"),
            Err(PatternError::InvertedRange { position: 1, .. })
        ));
        assert!(matches!(
            parse_template("x[z-a]"),
            Err(PatternError::InvertedRange { .. })
        ));
    }

    #[test]
    fn case_mismatch_is_rejected() {
        assert!(matches!(
            parse_template("[a-Z]"),
            Err(PatternError::CaseMismatch { .. })
        ));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        assert!(matches!(
            parse_template("[1-5:0]"),
            Err(PatternError::NonPositiveStep { .. })
        ));
        assert!(matches!(
            parse_template("[1-5:-2]"),
            Err(PatternError::NonPositiveStep { .. })
        ));
    }

    #[test]
    fn mixed_bounds_and_alpha_step_are_rejected() {
        assert!(matches!(
            parse_template("[a-9]"),
            Err(PatternError::MixedBounds { .. })
        ));
        assert!(matches!(
            parse_template("[a-z:2]"),
            Err(PatternError::AlphaStep { .. })
        ));
    }

    #[test]
    fn unterminated_delimiters_are_rejected() {
        assert_eq!(
            parse_template("http://x/[1-3"),
            Err(PatternError::Unterminated {
                position: 9,
                delimiter: '['
            })
        );
        assert_eq!(
            parse_template("http://x/{a,b"),
            Err(PatternError::Unterminated {
                position: 9,
                delimiter: '{'
            })
        );
    }

    #[test]
    fn malformed_lists_are_rejected() {
        assert!(matches!(parse_template("{}"), Err(PatternError::EmptyList { .. })));
        assert!(matches!(parse_template("{a,,b}"), Err(PatternError::EmptyItem { .. })));
        assert!(matches!(
            parse_template(r"{a\,b}"),
            Err(PatternError::EscapedDelimiter { delimiter: ',', .. })
        ));
        assert!(matches!(
            parse_template("{a,{b}}"),
            Err(PatternError::NestedDelimiter { .. })
        ));
    }

    #[test]
    fn non_range_brackets_stay_literal() {
        let parsed = parse_template("http://[::1]:8080/[literal-brackets]").unwrap();
        assert!(!parsed.is_expandable());
    }

    #[test]
    fn list_inside_literal_brackets_is_expanded() {
        let parsed = parse_template("https://x.com/[v{1,2}]").unwrap();
        assert_eq!(parsed.combination_count(), Some(2));
        assert_eq!(
            crate::glob::expand_template("https://x.com/[v{1,2}]", false).unwrap(),
            vec!["https://x.com/[v1]", "https://x.com/[v2]"]
        );
    }

    #[test]
    fn ignore_glob_keeps_single_literal() {
        let parsed = compile("[1-3]{a,b}", true).unwrap();
        assert_eq!(parsed.patterns().len(), 1);
        assert!(!parsed.is_expandable());
        assert_eq!(parsed.combination_count(), Some(1));
    }

    #[test]
    fn unicode_literals_survive() {
        let parsed = parse_template("https://例え.jp/ページ[1-2]").unwrap();
        assert_eq!(parsed.combination_count(), Some(2));
        assert_eq!(parsed.source(), "https://例え.jp/ページ[1-2]");
    }
}
