//! 字符串键值存储模块
//!
//! 引擎唯一的持久化边界, 相当于浏览器的按源 (per-origin) 存储:
//! - [`MemoryStore`] - 内存实现, 可模拟存储不可用 / 只读
//! - [`FileStore`] - 每个键一个 JSON 文件, 原子写入
//!
//! 多个上层 store 通过 `Arc` 共享同一个后端, 各自使用独立的键命名空间。

// ============================================================
// 子模块声明
// ============================================================

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// ============================================================
// 依赖导入
// ============================================================

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

// ============================================================
// 存储键
// ============================================================

/// 关卡进度文档
pub const STAGE_PROGRESS_KEY: &str = "stage-progress:v1";
/// 关卡定义缓存文档 (与业务数据分开的命名空间)
pub const STAGE_DEFINITION_CACHE_KEY: &str = "stage-definition-cache:v1";
/// 累计经验值
pub const TOTAL_XP_KEY: &str = "test-results:xp";
/// 答题记录前缀, 完整键为 `test-results:session:<testId>`
pub const RESULTS_SESSION_PREFIX: &str = "test-results:session";
/// 每关题数设置
pub const USER_CONFIG_KEY: &str = "user-config:max-count";
/// 玩家导入的数据集
pub const PLAYER_REGISTRY_KEY: &str = "playerRegistry:v1";

// ============================================================
// 时钟
// ============================================================

/// 毫秒时间戳来源, 测试中可替换为固定值
pub type Clock = fn() -> i64;

/// 当前 Unix 毫秒时间戳
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// KeyValueStore
// ============================================================

/// Durable, string-keyed storage holding one serialized document per key.
///
/// No locking or transactions: concurrent read-modify-write sequences
/// from different handles race and the later write wins.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

/// 读取并反序列化一个文档; 键不存在时返回 `Ok(None)`
pub fn load_document<T, S>(store: &S, key: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get_item(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// 序列化并整体写入一个文档
pub fn save_document<T, S>(store: &S, key: &str, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let payload = serde_json::to_string(value)?;
    store.set_item(key, &payload)
}
