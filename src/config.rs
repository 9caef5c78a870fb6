// ============================================================================
// 配置：数据目录、数据库文件名、最近用例条数
// ============================================================================

use std::path::PathBuf;

use crate::database::DEFAULT_DB_FILE;
use crate::services::stats::DEFAULT_RECENT_LIMIT;

/// 追踪器配置
///
/// 所有字段都有适合本地使用的默认值，可通过环境变量覆盖。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// 数据目录，数据库文件存放于此
    pub data_dir: PathBuf,
    /// 数据库文件名
    pub db_file_name: String,
    /// 仪表盘“最近用例”显示条数
    pub recent_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            data_dir: PathBuf::from(".test-tracker"),
            db_file_name: DEFAULT_DB_FILE.to_string(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl TrackerConfig {
    /// 从环境变量加载配置
    ///
    /// | 环境变量                     | 默认值            |
    /// |------------------------------|-------------------|
    /// | `TEST_TRACKER_DATA_DIR`      | `.test-tracker`   |
    /// | `TEST_TRACKER_DB_FILE`       | `test_tracker.db` |
    /// | `TEST_TRACKER_RECENT_LIMIT`  | `5`               |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置，无效的数字回退到默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = TrackerConfig::default();

        let data_dir = lookup("TEST_TRACKER_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let db_file_name = lookup("TEST_TRACKER_DB_FILE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.db_file_name);

        let recent_limit = match lookup("TEST_TRACKER_RECENT_LIMIT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!(
                    "TEST_TRACKER_RECENT_LIMIT 无效（{}），使用默认值 {}",
                    raw,
                    defaults.recent_limit
                );
                defaults.recent_limit
            }),
            None => defaults.recent_limit,
        };

        TrackerConfig {
            data_dir,
            db_file_name,
            recent_limit,
        }
    }
}
