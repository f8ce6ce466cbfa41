use std::path::Path;

use tokio::fs;

use crate::error::SourceReadError;

/// 批量文件中的一行模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 行号（从 1 开始）
    pub line_number: usize,
    pub template: String,
}

/// 从批量文件读取 URL 模板
///
/// 文件不存在或无法读取时整个调用失败，不返回部分结果
pub async fn load_batch_file(path: &Path) -> Result<Vec<SourceLine>, SourceReadError> {
    let meta = fs::metadata(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SourceReadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SourceReadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    if !meta.is_file() {
        return Err(SourceReadError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::InvalidData {
            SourceReadError::InvalidUtf8 {
                path: path.to_path_buf(),
            }
        } else {
            SourceReadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let lines = parse_batch_lines(&content);
    tracing::info!(
        "从 {} 读取到 {} 个模板",
        path.file_name().unwrap_or_default().to_string_lossy(),
        lines.len()
    );
    Ok(lines)
}

/// 过滤空行和整行注释，保持原始顺序
///
/// 行尾的 `#` 不视为注释，因为它是合法的 URL 片段标识
pub fn parse_batch_lines(content: &str) -> Vec<SourceLine> {
    split_lines(content)
        .enumerate()
        .filter_map(|(index, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(SourceLine {
                line_number: index + 1,
                template: line.to_string(),
            })
        })
        .collect()
}

/// 按 LF、CRLF、CR 统一切分
fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(content: &str) -> Vec<String> {
        parse_batch_lines(content)
            .into_iter()
            .map(|l| l.template)
            .collect()
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let content = "# header comment\n\nhttps://a.com/1\n   \n  # indented comment\nhttps://b.com/[1-2]\n";
        assert_eq!(templates(content), vec!["https://a.com/1", "https://b.com/[1-2]"]);
    }

    #[test]
    fn inline_hash_is_kept() {
        assert_eq!(
            templates("https://a.com/page#section # not a comment\n"),
            vec!["https://a.com/page#section # not a comment"]
        );
    }

    #[test]
    fn all_line_endings_are_supported() {
        let expected = vec!["https://a.com", "https://b.com", "https://c.com"];
        assert_eq!(templates("https://a.com\r\nhttps://b.com\r\nhttps://c.com"), expected);
        assert_eq!(templates("https://a.com\rhttps://b.com\rhttps://c.com\r"), expected);
        assert_eq!(templates("https://a.com\nhttps://b.com\r\nhttps://c.com\r"), expected);
    }

    #[test]
    fn line_numbers_count_every_physical_line() {
        let lines = parse_batch_lines("# c\n\nhttps://a.com\r\rhttps://b.com");
        assert_eq!(lines[0].line_number, 3);
        assert_eq!(lines[1].line_number, 5);
    }

    #[test]
    fn unicode_is_passed_through() {
        assert_eq!(
            templates("https://例え.jp/ページ\n"),
            vec!["https://例え.jp/ページ"]
        );
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let path = std::env::temp_dir().join("strongbird-missing-batch-file.txt");
        let err = load_batch_file(&path).await.unwrap_err();
        assert!(matches!(err, SourceReadError::NotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let err = load_batch_file(&std::env::temp_dir()).await.unwrap_err();
        assert!(matches!(err, SourceReadError::NotAFile { .. }));
    }

    #[tokio::test]
    async fn reads_file_in_order() {
        let path = std::env::temp_dir().join(format!(
            "strongbird-batch-{}.txt",
            std::process::id()
        ));
        fs::write(&path, "# urls\n\nhttps://a.com/1\nhttps://a.com/2\n")
            .await
            .unwrap();
        let lines = load_batch_file(&path).await.unwrap();
        fs::remove_file(&path).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].template, "https://a.com/1");
        assert_eq!(lines[1].template, "https://a.com/2");
    }
}
