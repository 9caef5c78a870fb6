// ============================================================================
// 统一错误类型定义
// 使用 thiserror 派生宏，所有模块共用 AppError / AppResult
// ============================================================================

use thiserror::Error;

/// 应用统一错误枚举
///
/// 每个变体对应一类错误。通过 `impl From<AppError> for String`
/// 保持与 commands 层 `Result<T, String>` 返回类型的兼容性。
#[derive(Debug, Error)]
pub enum AppError {
    /// 参数验证失败（如项目名称为空），只由 commands 层产生
    #[error("验证失败：{0}")]
    ValidationError(String),

    /// 更新或删除引用了不存在的 ID
    #[error("{kind} 不存在：{id}")]
    NotFound { kind: &'static str, id: String },

    /// 持久化数据无法解析为预期结构
    ///
    /// 只用于日志记录：读取时遇到该错误会按空集合处理，不会向上传播。
    #[error("持久化数据损坏（{key}）：{reason}")]
    MalformedPersistedData { key: String, reason: String },

    /// 数据库操作错误
    #[error("数据库错误：{0}")]
    DatabaseError(String),

    /// JSON 序列化失败
    #[error("序列化失败：{0}")]
    SerializationError(#[from] serde_json::Error),

    /// 时间戳格式化失败
    #[error("时间戳格式化失败：{0}")]
    TimestampError(String),

    /// 文件系统 IO 错误
    #[error("IO 错误：{0}")]
    IoError(#[from] std::io::Error),

    /// 共享状态的锁已被污染（持锁线程 panic）
    #[error("状态访问失败：无法获取锁")]
    LockPoisoned,
}

impl AppError {
    /// 构造项目不存在错误
    pub fn project_not_found(id: &str) -> Self {
        AppError::NotFound {
            kind: "项目",
            id: id.to_string(),
        }
    }

    /// 构造测试用例不存在错误
    pub fn test_case_not_found(id: &str) -> Self {
        AppError::NotFound {
            kind: "测试用例",
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

/// 便捷类型别名，统一项目内的 Result 签名
pub type AppResult<T> = Result<T, AppError>;

/// 将 AppError 转换为 String，供 commands 层直接返回给展示层
impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}
