//! URL 模板展开（curl 风格）
//!
//! - `pattern` - 片段类型
//! - `parser` - 模板解析，识别范围与列表
//! - `expander` - 按笛卡尔积惰性展开

pub mod expander;
pub mod parser;
pub mod pattern;

pub use expander::{expand_template, Expansion};
pub use parser::{compile, parse_template, ParsedTemplate};
pub use pattern::{Pattern, PatternKind, Span};
