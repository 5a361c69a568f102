//! 文本分块 - 业务能力层
//!
//! 把长文本切成固定大小、相邻重叠的窗口，避免题目素材被截断在边界上。
//!
//! ```text
//! chunk_size = 5, overlap = 2, step = 3
//! 文本:    ABCDEFGHIJ
//! chunk 0: ABCDE        [0, 5)
//! chunk 1:    DEFGH     [3, 8)
//! chunk 2:       GHIJ   [6, 10)
//! chunk 3:          J   [9, 10)
//! ```
//!
//! 偏移和长度都按字符（`char`）计算，不会切断多字节字符。

use crate::error::{AppResult, ConfigError};

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_OVERLAP: usize = 200;

/// 分块器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl Chunker {
    /// 要求 `chunk_size > 0` 且 `overlap < chunk_size`，否则步长为 0 会死循环
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ConfigError::InvalidChunking {
                chunk_size,
                overlap,
            }
            .into());
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// 相邻两块起点之间的距离
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// 惰性切分；空白文本得到空序列。再次调用即重新开始。
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        let start = if text.trim().is_empty() { text.len() } else { 0 };
        Chunks {
            text,
            start,
            chunk_size: self.chunk_size,
            step: self.step(),
        }
    }

    /// 长度为 `char_count` 的文本会被切成几块
    pub fn count_chunks(&self, char_count: usize) -> usize {
        if char_count == 0 {
            return 0;
        }
        (char_count + self.step() - 1) / self.step()
    }
}

/// 分块迭代器，`start` 为当前块起点的字节偏移
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    start: usize,
    chunk_size: usize,
    step: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.start..];
        let end = byte_offset_of_char(rest, self.chunk_size);
        let advance = byte_offset_of_char(rest, self.step);
        self.start += advance;

        Some(&rest[..end])
    }
}

/// 第 `n` 个字符的字节偏移，超出时为字符串长度
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunker: &Chunker, text: &str) -> Vec<String> {
        chunker.chunks(text).map(str::to_string).collect()
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(5, 5).is_err());
        assert!(Chunker::new(5, 7).is_err());
        assert!(Chunker::new(5, 0).is_ok());
    }

    #[test]
    fn test_basic_overlapping_windows() {
        let chunker = Chunker::new(5, 2).unwrap();
        assert_eq!(
            collect(&chunker, "ABCDEFGHIJ"),
            vec!["ABCDE", "DEFGH", "GHIJ", "J"]
        );
    }

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        let chunker = Chunker::default();
        assert_eq!(chunker.chunks("").count(), 0);
        assert_eq!(chunker.chunks("   \n\t  ").count(), 0);
    }

    #[test]
    fn test_short_text_gives_one_chunk() {
        let chunker = Chunker::default();
        assert_eq!(collect(&chunker, "just a few words"), vec!["just a few words"]);
    }

    #[test]
    fn test_default_sizes_on_long_text() {
        let chunker = Chunker::default();
        let text = "x".repeat(2100);
        let chunks = collect(&chunker, &text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2000);
        assert_eq!(chunks[1].len(), 300);
    }

    #[test]
    fn test_restartable() {
        let chunker = Chunker::new(4, 1).unwrap();
        let text = "abcdefghij";
        let first: Vec<&str> = chunker.chunks(text).collect();
        let second: Vec<&str> = chunker.chunks(text).collect();
        assert_eq!(first, second);

        let iter = chunker.chunks(text);
        let cloned = iter.clone();
        assert_eq!(iter.count(), cloned.count());
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let chunker = Chunker::new(3, 1).unwrap();
        let chunks = collect(&chunker, "日本語のテキスト");
        assert_eq!(chunks[0], "日本語");
        assert_eq!(chunks[1], "語のテ");
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
    }

    /// 覆盖性质：第 i 块从 i*step 开始，长度不超过 chunk_size，
    /// 相邻块重叠恰好 overlap 个字符（最后一块可能更短），所有块覆盖 [0, L)
    #[test]
    fn test_coverage_and_overlap_property() {
        let source: Vec<char> = "The quick brown fox jumps over the lazy dog. Ünïcödé ✓ "
            .chars()
            .cycle()
            .take(257)
            .collect();

        for (size, overlap) in [(1, 0), (7, 3), (10, 0), (16, 15), (50, 10), (300, 20)] {
            let chunker = Chunker::new(size, overlap).unwrap();
            for len in [1usize, 2, 9, 10, 11, 64, 257] {
                let text: String = source[..len].iter().collect();
                let chunks: Vec<Vec<char>> =
                    chunker.chunks(&text).map(|c| c.chars().collect()).collect();

                let step = size - overlap;
                assert_eq!(chunks.len(), chunker.count_chunks(len));

                let mut covered = vec![false; len];
                for (i, chunk) in chunks.iter().enumerate() {
                    let start = i * step;
                    let end = (start + size).min(len);
                    assert!(chunk.len() <= size);
                    assert_eq!(chunk.as_slice(), &source[start..end]);
                    covered[start..end].iter_mut().for_each(|c| *c = true);

                    if let Some(next) = chunks.get(i + 1) {
                        let shared = overlap.min(next.len());
                        assert_eq!(&chunk[step..step + shared], &next[..shared]);
                    }
                }
                assert!(covered.iter().all(|c| *c), "size={size} overlap={overlap} len={len}");
            }
        }
    }
}
