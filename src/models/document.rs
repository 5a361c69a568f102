use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// 上传文档的元数据
///
/// 上传时创建，之后不再修改；提取出的文本不落库，只用于驱动后台生成。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(filename: impl Into<String>, file_size: u64) -> Self {
        Self {
            id: super::new_record_id(),
            filename: filename.into(),
            file_size,
            upload_date: Utc::now(),
        }
    }
}

impl Record for DocumentRecord {
    const COLLECTION: &'static str = "documents";

    fn id(&self) -> &str {
        &self.id
    }
}
