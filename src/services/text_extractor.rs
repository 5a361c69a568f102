//! 文本提取服务 - 业务能力层
//!
//! 只负责"把上传的文件变成纯文本"，按扩展名分发：
//! - `.txt`  直接按 UTF-8 读取
//! - `.pdf`  pdf-extract
//! - `.docx` docx-rs，每个段落一行
//!
//! PDF / DOCX 解析是同步 CPU 工作，放在 `spawn_blocking` 里执行。

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, ExtractError};

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// 根据扩展名判断文件类型（忽略大小写）
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(DocumentKind::Txt),
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            _ => Err(ExtractError::UnsupportedType {
                extension: if extension.is_empty() {
                    "(无扩展名)".to_string()
                } else {
                    format!(".{}", extension)
                },
            }),
        }
    }
}

/// 判断文件是否是支持的类型
pub fn is_supported(path: &Path) -> bool {
    DocumentKind::from_path(path).is_ok()
}

/// 文本提取服务
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取文件文本并规范化空白
    ///
    /// 不支持的扩展名返回 `UnsupportedType`，提取结果为空白返回 `NoReadableText`。
    pub async fn extract(&self, path: impl AsRef<Path>) -> AppResult<String> {
        let path = path.as_ref().to_path_buf();
        let kind = DocumentKind::from_path(&path)?;
        debug!("提取文本: {} ({:?})", path.display(), kind);

        let raw = match kind {
            DocumentKind::Txt => read_txt(&path).await?,
            DocumentKind::Pdf => run_blocking(path.clone(), extract_pdf).await?,
            DocumentKind::Docx => run_blocking(path.clone(), extract_docx).await?,
        };

        let text = normalize_whitespace(&raw);
        if text.trim().is_empty() {
            return Err(ExtractError::NoReadableText {
                path: path.display().to_string(),
            }
            .into());
        }

        info!(
            "✓ 文本提取完成: {} ({} 字符)",
            path.display(),
            text.chars().count()
        );
        Ok(text)
    }
}

async fn read_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ExtractError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn run_blocking(
    path: PathBuf,
    extract: fn(&Path) -> Result<String, ExtractError>,
) -> AppResult<String> {
    let text = tokio::task::spawn_blocking(move || extract(&path))
        .await
        .map_err(|e| AppError::Other(format!("文本提取任务异常退出: {}", e)))??;
    Ok(text)
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf {
        message: format!("{} (文件: {})", e, path.display()),
    })
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::Docx {
        message: format!("{} (文件: {})", e, path.display()),
    })?;

    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let docx_rs::RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
static LINE_EDGES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// 统一换行符，合并连续的空格/制表符，3 个以上的连续换行合并为 2 个
pub fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = SPACE_RUNS.replace_all(&unified, " ");
    let trimmed_lines = LINE_EDGES.replace_all(&collapsed, "\n");
    BLANK_RUNS
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::assert_ok;

    #[test]
    fn test_document_kind_from_extension() {
        assert_eq!(
            DocumentKind::from_path(Path::new("a/b/notes.TXT")).unwrap(),
            DocumentKind::Txt
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("paper.pdf")).unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("essay.docx")).unwrap(),
            DocumentKind::Docx
        );
        assert!(matches!(
            DocumentKind::from_path(Path::new("slides.pptx")),
            Err(ExtractError::UnsupportedType { extension }) if extension == ".pptx"
        ));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_normalize_whitespace() {
        let raw = "Title\r\n\r\n\r\n\r\nFirst   line\t\twith  tabs   \n\n\n\nSecond";
        assert_eq!(
            normalize_whitespace(raw),
            "Title\n\nFirst line with tabs\n\nSecond"
        );
        assert_eq!(normalize_whitespace("  \n\t \n "), "");
    }

    #[tokio::test]
    async fn test_extract_txt() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Photosynthesis   converts light.\n\n\n\nPlants   need it.").unwrap();

        let text = assert_ok!(TextExtractor::new().extract(file.path()).await);
        assert_eq!(text, "Photosynthesis converts light.\n\nPlants need it.");
    }

    #[tokio::test]
    async fn test_blank_txt_has_no_readable_text() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "   \n\n  ").unwrap();

        let err = TextExtractor::new().extract(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extract(ExtractError::NoReadableText { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected_before_reading() {
        let err = TextExtractor::new()
            .extract("does/not/exist.csv")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extract(ExtractError::UnsupportedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_reports_read_failure() {
        let err = TextExtractor::new()
            .extract("does/not/exist.txt")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extract(ExtractError::ReadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_docx_reports_parse_failure() {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        write!(file, "definitely not a zip archive").unwrap();

        let err = TextExtractor::new().extract(file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::Extract(ExtractError::Docx { .. })));
    }
}
