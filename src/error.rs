use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 模型生成错误（不可重试或重试耗尽）
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文本提取错误
    #[error("文本提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 模型生成错误
///
/// 全部为 Fatal：可重试的情况（503、网络错误）在客户端内部消化，
/// 只有重试耗尽后才以 `RetriesExhausted` 的形式出现在这里。
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 上游返回了不可重试的 HTTP 状态码
    #[error("模型 API 返回 HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// 响应体不是合法 JSON
    #[error("模型 API 响应无法解析 ({reason}), 原始响应: {body}")]
    InvalidEnvelope { reason: String, body: String },
    /// JSON 合法但缺少 candidates[0].content.parts[0].text
    #[error("模型 API 响应缺少生成文本, 原始响应: {body}")]
    MissingText { body: String },
    /// 重试次数耗尽
    #[error("模型 API 调用在 {attempts} 次尝试后仍失败, 最后一次错误: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    /// 客户端侧的请求构建失败（不可重试）
    #[error("模型 API 请求构建失败: {message}")]
    Transport { message: String },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 记录不存在
    #[error("{collection} 中不存在记录 {id}")]
    NotFound { collection: String, id: String },
    /// 读写快照文件失败
    #[error("读写存储文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 快照序列化失败
    #[error("{collection} 序列化失败: {source}")]
    Serialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 文本提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 不支持的文件类型
    #[error("不支持的文件类型: {extension}, 仅支持 .pdf, .txt, .docx")]
    UnsupportedType { extension: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// PDF 解析失败
    #[error("PDF 解析失败: {message}")]
    Pdf { message: String },
    /// DOCX 解析失败
    #[error("DOCX 解析失败: {message}")]
    Docx { message: String },
    /// 没有可读文本
    #[error("文档中没有可读的文本内容: {path}")]
    NoReadableText { path: String },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 题目数量超出范围
    #[error("题目数量 {requested} 超出范围 [{min}, {max}]")]
    InvalidQuestionCount {
        requested: usize,
        min: usize,
        max: usize,
    },
    /// 主题为空
    #[error("主题不能为空")]
    EmptyTopic,
    /// 题目数据不合法
    #[error("题目数据不合法: {reason}")]
    InvalidQuestion { reason: String },
    /// 题库中题目不足
    #[error("题目不足以组成测验: 找到 {found} 道, 需要 {requested} 道")]
    NotEnoughQuestions { found: usize, requested: usize },
    /// 提交中没有答案
    #[error("提交中没有任何答案")]
    EmptySubmission,
    /// 没有符合导出条件的题目
    #[error("没有符合导出条件的题目")]
    NothingToExport,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少 API Key
    #[error("未设置 GEMINI_API_KEY")]
    MissingApiKey,
    /// 分块参数不合法
    #[error("分块参数不合法: chunk_size={chunk_size}, overlap={overlap} (要求 overlap < chunk_size 且 chunk_size > 0)")]
    InvalidChunking { chunk_size: usize, overlap: usize },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========
// anyhow 已经为所有实现了 std::error::Error 的类型提供了自动转换

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Store(StoreError::Io {
            path: String::new(),
            source: err,
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(StoreError::Serialize {
            collection: String::new(),
            source: err,
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Generation(GenerationError::Transport {
            message: err.to_string(),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建记录不存在错误
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::Store(StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        })
    }

    /// 创建题目不合法错误
    pub fn invalid_question(reason: impl Into<String>) -> Self {
        AppError::Business(BusinessError::InvalidQuestion {
            reason: reason.into(),
        })
    }

    /// 是否为"记录不存在"
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Store(StoreError::NotFound { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
