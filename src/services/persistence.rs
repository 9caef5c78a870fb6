// ============================================================================
// 持久化适配器
// ============================================================================
//
// Store 只依赖 KvStore trait：按名称读写整段文本。集合以 JSON 数组整体覆盖
// 写入，不做增量更新。读取时遇到缺失或损坏的数据一律按空集合处理。

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::error::{AppError, AppResult};

/// 项目集合的存储键
pub const PROJECTS_KEY: &str = "projects";
/// 测试用例集合的存储键
pub const TEST_CASES_KEY: &str = "testCases";

// ============================================================================
// 键值存储 Trait 定义
// ============================================================================

/// 持久化键值存储 trait
///
/// 不同的存储后端（SQLite、内存）实现此 trait，Store 通过 trait 对象使用。
pub trait KvStore: Send {
    /// 读取键对应的值，从未写入时返回 `Ok(None)`
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 写入单个键值，覆盖旧值
    fn put(&mut self, key: &str, value: String) -> AppResult<()>;

    /// 原子地写入多个键值：要么全部生效，要么全部不生效
    fn put_many(&mut self, entries: &[(&str, String)]) -> AppResult<()>;
}

// ============================================================================
// 内存存储
// ============================================================================

/// 基于 HashMap 的内存存储，用于测试和无需落盘的临时会话
#[derive(Default, Debug, Clone)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> AppResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn put_many(&mut self, entries: &[(&str, String)]) -> AppResult<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

// ============================================================================
// 集合读写
// ============================================================================

/// 读取集合
///
/// 从未保存、读取失败或内容无法解析为预期结构时，都返回空集合并记录警告，
/// 不会向上抛出错误。
pub fn load_collection<T: DeserializeOwned>(kv: &dyn KvStore, key: &str) -> Vec<T> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("读取集合 {} 失败，按空集合处理：{}", key, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(e) => {
            let err = AppError::MalformedPersistedData {
                key: key.to_string(),
                reason: e.to_string(),
            };
            log::warn!("{}，按空集合处理", err);
            Vec::new()
        }
    }
}

/// 序列化集合为 JSON 文本
pub fn encode_collection<T: Serialize>(items: &[T]) -> AppResult<String> {
    Ok(serde_json::to_string(items)?)
}

/// 保存集合，整体覆盖键下的旧值
pub fn save_collection<T: Serialize>(
    kv: &mut dyn KvStore,
    key: &str,
    items: &[T],
) -> AppResult<()> {
    let raw = encode_collection(items)?;
    kv.put(key, raw)?;
    log::debug!("已保存集合 {}（{} 条）", key, items.len());
    Ok(())
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entities::Project;

    fn sample_projects() -> Vec<Project> {
        vec![
            Project {
                id: "p1".to_string(),
                name: "Alpha".to_string(),
                description: "first".to_string(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
            Project {
                id: "p2".to_string(),
                name: "Beta".to_string(),
                description: "second".to_string(),
                created_at: "2024-01-02T00:00:00Z".to_string(),
            },
        ]
    }

    #[test]
    fn test_load_absent_key_returns_empty() {
        let kv = MemoryKv::new();
        let loaded: Vec<Project> = load_collection(&kv, PROJECTS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut kv = MemoryKv::new();
        let projects = sample_projects();
        save_collection(&mut kv, PROJECTS_KEY, &projects).unwrap();

        let loaded: Vec<Project> = load_collection(&kv, PROJECTS_KEY);
        assert_eq!(loaded, projects);
    }

    #[test]
    fn test_save_empty_collection_round_trip() {
        let mut kv = MemoryKv::new();
        save_collection::<Project>(&mut kv, PROJECTS_KEY, &[]).unwrap();

        assert_eq!(kv.get(PROJECTS_KEY).unwrap(), Some("[]".to_string()));
        let loaded: Vec<Project> = load_collection(&kv, PROJECTS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_corrupt_payload_returns_empty() {
        let mut kv = MemoryKv::new();
        kv.put(PROJECTS_KEY, "{not json".to_string()).unwrap();

        let loaded: Vec<Project> = load_collection(&kv, PROJECTS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_shape_mismatch_returns_empty() {
        let mut kv = MemoryKv::new();
        // 合法 JSON，但缺少必需字段
        kv.put(PROJECTS_KEY, r#"[{"id":"p1"}]"#.to_string()).unwrap();

        let loaded: Vec<Project> = load_collection(&kv, PROJECTS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_value() {
        let mut kv = MemoryKv::new();
        let mut projects = sample_projects();
        save_collection(&mut kv, PROJECTS_KEY, &projects).unwrap();

        projects.truncate(1);
        save_collection(&mut kv, PROJECTS_KEY, &projects).unwrap();

        let loaded: Vec<Project> = load_collection(&kv, PROJECTS_KEY);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "p1");
    }

    #[test]
    fn test_keys_are_independent() {
        let mut kv = MemoryKv::new();
        save_collection(&mut kv, PROJECTS_KEY, &sample_projects()).unwrap();

        let test_cases: Vec<Project> = load_collection(&kv, TEST_CASES_KEY);
        assert!(test_cases.is_empty());
    }

    #[test]
    fn test_persisted_format_uses_camel_case() {
        let mut kv = MemoryKv::new();
        save_collection(&mut kv, PROJECTS_KEY, &sample_projects()).unwrap();

        let raw = kv.get(PROJECTS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"createdAt\":\"2024-01-01T00:00:00Z\""));
    }
}
