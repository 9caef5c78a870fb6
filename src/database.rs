// ============================================================================
// 数据库模块：SQLite 键值持久化层
// 使用 rusqlite 直接操作 SQLite，每个集合以整体 JSON 文本存成一行
// ============================================================================

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::services::persistence::KvStore;
use crate::utils::clock::{format_timestamp, Clock, SystemClock};
use crate::utils::error::{AppError, AppResult};

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "test_tracker.db";

// ============================================================================
// 数据库管理器
// ============================================================================

/// 数据库管理器，封装 rusqlite 连接
pub struct Database {
    /// SQLite 数据库连接
    conn: Connection,
    /// 写入行的 updated_at 时间来源
    clock: Box<dyn Clock>,
}

impl Database {
    /// 初始化数据库：在指定目录创建数据库文件并建表
    ///
    /// # 参数
    /// - `data_dir`: 数据目录路径，不存在时自动创建
    /// - `db_file_name`: 数据库文件名
    ///
    /// # 返回
    /// - `Ok(Database)`: 初始化成功，返回数据库实例
    /// - `Err(AppError)`: 目录创建、文件打开或建表失败
    pub fn init(data_dir: &Path, db_file_name: &str) -> AppResult<Self> {
        // 确保数据目录存在
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(db_file_name);
        let conn = Connection::open(&db_path).map_err(|e| {
            AppError::DatabaseError(format!("无法打开数据库文件 {}: {}", db_path.display(), e))
        })?;

        Self::create_tables(&conn)?;
        log::info!("数据库已就绪：{}", db_path.display());

        Ok(Database {
            conn,
            clock: Box::new(SystemClock),
        })
    }

    /// 打开内存数据库，进程结束即丢失，用于临时会话
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_tables(&conn)?;
        Ok(Database {
            conn,
            clock: Box::new(SystemClock),
        })
    }

    /// 替换写入时间来源，与 Store 共用同一时钟时行时间戳保持一致
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 创建键值表（如果不存在）
    fn create_tables(conn: &Connection) -> AppResult<()> {
        conn.execute_batch(
            "
            -- 键值表：每个集合一行，value 为整个集合的 JSON 文本
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| AppError::DatabaseError(format!("创建表结构时出错: {}", e)))?;

        Ok(())
    }

    /// 获取数据库连接的引用
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// 读取键对应的值，键不存在时返回 None
    pub fn get_value(&self, key: &str) -> AppResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::DatabaseError(format!("读取 {} 失败：{}", key, e)))
    }

    /// 写入单个键值，已存在则覆盖
    pub fn put_value(&self, key: &str, value: &str) -> AppResult<()> {
        let now = format_timestamp(self.clock.now())?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, now],
            )
            .map_err(|e| AppError::DatabaseError(format!("写入 {} 失败：{}", key, e)))?;

        Ok(())
    }

    /// 在同一事务中写入多个键值：全部成功或全部回滚
    pub fn put_values(&mut self, entries: &[(&str, String)]) -> AppResult<()> {
        let now = format_timestamp(self.clock.now())?;
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, now],
            )
            .map_err(|e| AppError::DatabaseError(format!("写入 {} 失败：{}", key, e)))?;
        }
        // tx 未提交即被 drop 时自动回滚
        tx.commit()?;

        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.get_value(key)
    }

    fn put(&mut self, key: &str, value: String) -> AppResult<()> {
        self.put_value(key, &value)
    }

    fn put_many(&mut self, entries: &[(&str, String)]) -> AppResult<()> {
        self.put_values(entries)
    }
}

// ============================================================================
// 单元测试
// ============================================================================
