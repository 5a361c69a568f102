//! 单个集合：内存中的记录列表 + 可选的 JSON 快照文件

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::Record;
use crate::error::{AppResult, StoreError};

/// 文档集合
///
/// 每次写操作都在副本上进行，整体写一次快照（先写临时文件再 rename）后
/// 再替换内存数据；没有配置路径时只保存在内存里。
pub struct Collection<T: Record> {
    items: RwLock<Vec<T>>,
    path: Option<PathBuf>,
}

impl<T: Record> Collection<T> {
    /// 纯内存集合
    pub fn in_memory() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// 从 `<dir>/<collection>.json` 加载，文件不存在时为空集合
    pub async fn open(dir: &Path) -> AppResult<Self> {
        let path = dir.join(format!("{}.json", T::COLLECTION));

        let items: Vec<T> = match fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => {
                serde_json::from_str(&content).map_err(|source| StoreError::Serialize {
                    collection: T::COLLECTION.to_string(),
                    source,
                })?
            }
            Ok(_) => Vec::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                }
                .into())
            }
        };

        info!("✓ 集合 {} 已加载 {} 条记录", T::COLLECTION, items.len());

        Ok(Self {
            items: RwLock::new(items),
            path: Some(path),
        })
    }

    pub async fn insert_one(&self, record: T) -> AppResult<T> {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        next.push(record.clone());
        self.commit(&mut items, next).await?;
        Ok(record)
    }

    pub async fn insert_many(&self, records: Vec<T>) -> AppResult<Vec<T>> {
        if records.is_empty() {
            return Ok(records);
        }
        let mut items = self.items.write().await;
        let mut next = items.clone();
        next.extend(records.iter().cloned());
        self.commit(&mut items, next).await?;
        debug!("{} 批量插入 {} 条记录", T::COLLECTION, records.len());
        Ok(records)
    }

    /// 按条件查询，保持插入顺序
    pub async fn find<F>(&self, filter: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let items = self.items.read().await;
        items.iter().filter(|item| filter(item)).cloned().collect()
    }

    pub async fn find_one(&self, id: &str) -> Option<T> {
        let items = self.items.read().await;
        items.iter().find(|item| item.id() == id).cloned()
    }

    /// 修改一条记录，返回修改后的记录；记录不存在时返回 `None`
    pub async fn update_one<F>(&self, id: &str, patch: F) -> AppResult<Option<T>>
    where
        F: FnOnce(&mut T) -> AppResult<()>,
    {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        let Some(item) = next.iter_mut().find(|item| item.id() == id) else {
            return Ok(None);
        };
        patch(item)?;
        let updated = item.clone();
        self.commit(&mut items, next).await?;
        Ok(Some(updated))
    }

    /// 删除一条记录，返回是否删除成功
    pub async fn delete_one(&self, id: &str) -> AppResult<bool> {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        next.retain(|item| item.id() != id);
        if next.len() == items.len() {
            return Ok(false);
        }
        self.commit(&mut items, next).await?;
        Ok(true)
    }

    pub async fn count(&self) -> usize {
        self.items.read().await.len()
    }

    /// 快照写入成功后才替换内存中的数据，写入失败时集合保持原样
    async fn commit(&self, items: &mut Vec<T>, next: Vec<T>) -> AppResult<()> {
        self.persist(&next).await?;
        *items = next;
        Ok(())
    }

    async fn persist(&self, items: &[T]) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Serialize {
            collection: T::COLLECTION.to_string(),
            source,
        })?;

        let tmp_path = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::write(&tmp_path, json).await.map_err(io_err)?;
        fs::rename(&tmp_path, path).await.map_err(io_err)?;
        Ok(())
    }
}
