//! URL 模板中的模式片段
//!
//! 一个模板被解析为若干首尾相接的 `Pattern`，字面量片段填充在可展开片段之间

use std::borrow::Cow;

/// 片段在原始模板中的位置（字节偏移，左闭右开）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// 片段类型及其数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// `[001-010]`、`[1-10:2]`
    NumericRange {
        start: u64,
        end: u64,
        step: u64,
        /// 补零宽度，0 表示不补零
        width: usize,
    },
    /// `[a-e]`、`[A-E]`
    AlphaRange { start: char, end: char },
    /// `{one,two,three}`，保持原始顺序，允许重复
    List { items: Vec<String> },
    /// 原样输出的文本
    Literal { text: String },
}

/// 模板中的一个片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

impl Pattern {
    pub fn literal(text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: PatternKind::Literal { text: text.into() },
            span,
        }
    }

    /// 是否为可展开的片段
    pub fn is_expandable(&self) -> bool {
        !matches!(self.kind, PatternKind::Literal { .. })
    }

    /// 取值域大小，字面量为 1
    pub fn domain_len(&self) -> usize {
        match &self.kind {
            PatternKind::NumericRange { start, end, step, .. } => {
                usize::try_from((end - start) / step).map_or(usize::MAX, |n| n.saturating_add(1))
            }
            PatternKind::AlphaRange { start, end } => (*end as usize) - (*start as usize) + 1,
            PatternKind::List { items } => items.len(),
            PatternKind::Literal { .. } => 1,
        }
    }

    /// 取值域中第 `index` 个值
    ///
    /// `index` 必须小于 `domain_len()`
    pub fn value_at(&self, index: usize) -> Cow<'_, str> {
        match &self.kind {
            PatternKind::NumericRange {
                start, step, width, ..
            } => {
                let value = start + (index as u64) * step;
                Cow::Owned(format!("{:0width$}", value, width = *width))
            }
            PatternKind::AlphaRange { start, .. } => {
                let code = *start as u32 + index as u32;
                Cow::Owned(char::from_u32(code).map(String::from).unwrap_or_default())
            }
            PatternKind::List { items } => Cow::Borrowed(items[index].as_str()),
            PatternKind::Literal { text } => Cow::Borrowed(text.as_str()),
        }
    }
}
