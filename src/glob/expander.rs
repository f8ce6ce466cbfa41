//! 模板展开
//!
//! 对所有片段的取值域做笛卡尔积：最左侧片段变化最慢，最右侧变化最快，
//! 与嵌套循环的枚举顺序一致。

use crate::error::PatternError;
use crate::glob::parser::{compile, ParsedTemplate};

/// 展开迭代器
///
/// 惰性生成，每次调用 [`ParsedTemplate::expand`] 都从头开始，
/// 不在两次展开之间保留任何状态
#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    template: &'a ParsedTemplate,
    /// 每个片段当前取值的下标（里程表）
    cursor: Vec<usize>,
    remaining: Option<usize>,
    exhausted: bool,
}

impl ParsedTemplate {
    /// 生成展开迭代器
    pub fn expand(&self) -> Expansion<'_> {
        let exhausted = self.patterns().iter().any(|p| p.domain_len() == 0);
        Expansion {
            template: self,
            cursor: vec![0; self.patterns().len()],
            remaining: if exhausted {
                Some(0)
            } else {
                self.combination_count()
            },
            exhausted,
        }
    }
}

impl Expansion<'_> {
    fn render(&self) -> String {
        let mut url = String::with_capacity(self.template.source().len());
        for (pattern, &index) in self.template.patterns().iter().zip(&self.cursor) {
            url.push_str(&pattern.value_at(index));
        }
        url
    }

    /// 从最右侧开始进位，全部回绕时结束
    fn advance(&mut self) {
        let patterns = self.template.patterns();
        for slot in (0..patterns.len()).rev() {
            self.cursor[slot] += 1;
            if self.cursor[slot] < patterns[slot].domain_len() {
                return;
            }
            self.cursor[slot] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Expansion<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }
        let url = self.render();
        self.advance();
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        Some(url)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }
}

/// 解析并完整展开一个模板
pub fn expand_template(template: &str, ignore_glob: bool) -> Result<Vec<String>, PatternError> {
    let parsed = compile(template, ignore_glob)?;
    Ok(parsed.expand().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(template: &str) -> Vec<String> {
        expand_template(template, false).unwrap()
    }

    #[test]
    fn numeric_range_without_padding() {
        let urls = expand("page-[1-10]");
        assert_eq!(urls.len(), 10);
        assert_eq!(urls.first().map(String::as_str), Some("page-1"));
        assert_eq!(urls.last().map(String::as_str), Some("page-10"));
        assert!(urls.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn numeric_range_keeps_zero_padding() {
        let urls = expand("page-[001-010]");
        assert_eq!(urls.len(), 10);
        assert_eq!(urls[0], "page-001");
        assert_eq!(urls[8], "page-009");
        assert_eq!(urls[9], "page-010");
    }

    #[test]
    fn step_excludes_values_past_end() {
        assert_eq!(expand("[1-10:5]"), vec!["1", "6"]);
    }

    #[test]
    fn alpha_ranges() {
        assert_eq!(expand("[a-c]"), vec!["a", "b", "c"]);
        assert_eq!(expand("[A-C]"), vec!["A", "B", "C"]);
    }

    #[test]
    fn leftmost_pattern_varies_slowest() {
        assert_eq!(expand("{x,y}/[1-2]"), vec!["x/1", "x/2", "y/1", "y/2"]);
    }

    #[test]
    fn ignore_glob_returns_template_unchanged() {
        assert_eq!(
            expand_template("[literal-brackets]", true).unwrap(),
            vec!["[literal-brackets]"]
        );
        assert_eq!(expand_template("a[1-3]", true).unwrap(), vec!["a[1-3]"]);
    }

    #[test]
    fn template_without_patterns_expands_to_itself() {
        assert_eq!(
            expand("https://example.com/page.html"),
            vec!["https://example.com/page.html"]
        );
    }

    #[test]
    fn inverted_range_produces_no_expansion() {
        assert!(expand_template("https://x.com/[5-1]", false).is_err());
    }

    #[test]
    fn expansion_is_restartable_and_deterministic() {
        let parsed = compile("https://x.com/{a,b}/[1-3]", false).unwrap();
        let first: Vec<String> = parsed.expand().collect();
        let second: Vec<String> = parsed.expand().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn duplicates_in_lists_are_kept() {
        assert_eq!(expand("{a,a}"), vec!["a", "a"]);
    }

    #[test]
    fn size_hint_tracks_remaining() {
        let parsed = compile("[1-4]{a,b}", false).unwrap();
        let mut it = parsed.expand();
        assert_eq!(it.size_hint(), (8, Some(8)));
        it.next();
        assert_eq!(it.size_hint(), (7, Some(7)));
    }

    #[test]
    fn multi_pattern_url() {
        let urls = expand("https://site.com/{en,fr}/ch[01-02]/s[a-b]");
        assert_eq!(urls.len(), 8);
        assert_eq!(urls[0], "https://site.com/en/ch01/sa");
        assert_eq!(urls[7], "https://site.com/fr/ch02/sb");
    }
}
