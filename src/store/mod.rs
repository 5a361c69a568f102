//! 存储层
//!
//! 三个集合：questions / documents / quiz_results。
//! 生成流程只依赖 questions 的批量插入。

pub mod collection;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::fs;

pub use collection::Collection;

use crate::error::{AppResult, StoreError};
use crate::models::{DocumentRecord, QuestionRecord, QuizResult};

/// 可存入集合的记录
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 集合名，同时也是快照文件名
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// 文档存储
pub struct Store {
    pub questions: Collection<QuestionRecord>,
    pub documents: Collection<DocumentRecord>,
    pub quiz_results: Collection<QuizResult>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            questions: Collection::in_memory(),
            documents: Collection::in_memory(),
            quiz_results: Collection::in_memory(),
        }
    }

    /// 打开数据目录（不存在时创建）
    pub async fn open(data_dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.display().to_string(),
                source,
            })?;

        Ok(Self {
            questions: Collection::open(dir).await?,
            documents: Collection::open(dir).await?,
            quiz_results: Collection::open(dir).await?,
        })
    }
}
