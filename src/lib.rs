// ============================================================================
// [总线] 程序的组装车间
// ✅ 只能做：pub mod 暴露子模块、组装 Store 与共享状态
// ⛔ 禁止：直接实现业务逻辑或 command 函数
// ============================================================================

pub mod commands;
pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

use crate::commands::tracker::TrackerState;
use crate::config::TrackerConfig;
use crate::database::Database;
use crate::services::store::Store;
use crate::utils::error::AppResult;

// ============================================================================
// 应用入口
// ============================================================================

/// 打开追踪器：初始化数据库、加载 Store、构造共享状态
///
/// 进程启动时调用一次；退出前调用 `TrackerState::shutdown` 落盘。
pub fn open_tracker(config: &TrackerConfig) -> AppResult<TrackerState> {
    let db = Database::init(&config.data_dir, &config.db_file_name)?;
    let store = Store::open(Box::new(db));
    Ok(TrackerState::new(store, config.recent_limit))
}
