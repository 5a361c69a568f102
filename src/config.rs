//! 程序配置
//!
//! 读取顺序：默认值 → TOML 配置文件（`MCQ_CONFIG` 指定，否则当前目录的 `mcq.toml`，不存在则跳过）→ 环境变量。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppResult, ConfigError};
use crate::models::Difficulty;
use crate::services::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::services::failure_log::DEFAULT_FAILURE_LOG;

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "mcq.toml";

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// 程序配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型 API 配置 ---
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 总尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待时间（毫秒），之后每次翻倍
    pub initial_backoff_ms: u64,

    // --- 生成配置 ---
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub questions_per_chunk: usize,
    pub default_difficulty: Difficulty,
    pub category: Option<String>,
    /// 启动时按主题生成（不设置则跳过）
    pub topic: Option<String>,
    pub topic_num_questions: usize,

    // --- 文件与并发 ---
    /// 数据快照目录
    pub data_dir: String,
    /// 待处理文档目录
    pub documents_folder: String,
    pub failure_log_file: String,
    /// 处理完成后导出 JSON（不设置则不导出）
    pub export_file: Option<String>,
    /// 同时运行的后台生成任务数量
    pub max_concurrent_jobs: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            request_timeout_secs: 60,
            max_attempts: 5,
            initial_backoff_ms: 1000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
            questions_per_chunk: 2,
            default_difficulty: Difficulty::Medium,
            category: None,
            topic: None,
            topic_num_questions: 5,
            data_dir: "data".to_string(),
            documents_folder: "uploaded_documents".to_string(),
            failure_log_file: DEFAULT_FAILURE_LOG.to_string(),
            export_file: None,
            max_concurrent_jobs: 2,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 默认值 + 配置文件 + 环境变量，并校验
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("MCQ_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };

        let config = base.with_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 读取 TOML 配置文件，缺省字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::FileParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 用 `lookup` 返回的值覆盖对应字段；值存在但无法解析时报错
    pub fn with_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        env.string("GEMINI_API_KEY", &mut self.gemini_api_key);
        env.string("GEMINI_API_URL", &mut self.gemini_api_url);
        env.parse("REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs)?;
        env.parse("MAX_ATTEMPTS", &mut self.max_attempts)?;
        env.parse("INITIAL_BACKOFF_MS", &mut self.initial_backoff_ms)?;
        env.parse("CHUNK_SIZE", &mut self.chunk_size)?;
        env.parse("CHUNK_OVERLAP", &mut self.chunk_overlap)?;
        env.parse("QUESTIONS_PER_CHUNK", &mut self.questions_per_chunk)?;
        env.parse("DEFAULT_DIFFICULTY", &mut self.default_difficulty)?;
        env.optional("MCQ_CATEGORY", &mut self.category);
        env.optional("MCQ_TOPIC", &mut self.topic);
        env.parse("TOPIC_NUM_QUESTIONS", &mut self.topic_num_questions)?;
        env.string("DATA_DIR", &mut self.data_dir);
        env.string("DOCUMENTS_FOLDER", &mut self.documents_folder);
        env.string("FAILURE_LOG_FILE", &mut self.failure_log_file);
        env.optional("EXPORT_FILE", &mut self.export_file);
        env.parse("MAX_CONCURRENT_JOBS", &mut self.max_concurrent_jobs)?;
        env.parse("VERBOSE_LOGGING", &mut self.verbose_logging)?;

        Ok(self)
    }

    /// 检查必填项和分块参数
    pub fn validate(&self) -> AppResult<()> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidChunking {
                chunk_size: self.chunk_size,
                overlap: self.chunk_overlap,
            }
            .into());
        }
        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str, target: &mut String) {
        if let Some(value) = (self.lookup)(name) {
            *target = value;
        }
    }

    /// 空字符串表示清除
    fn optional(&self, name: &str, target: &mut Option<String>) {
        if let Some(value) = (self.lookup)(name) {
            let value = value.trim().to_string();
            *target = if value.is_empty() { None } else { Some(value) };
        }
    }

    fn parse<T: FromStr>(&self, name: &str, target: &mut T) -> Result<(), ConfigError> {
        let Some(value) = (self.lookup)(name) else {
            return Ok(());
        };
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: value.clone(),
                expected_type: std::any::type_name::<T>().to_string(),
            })?;
        Ok(())
    }
}
