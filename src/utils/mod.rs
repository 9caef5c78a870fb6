// ============================================================================
// 通用工具：错误类型、时钟、ID 生成
// ============================================================================

pub mod clock;
pub mod error;
pub mod id;
