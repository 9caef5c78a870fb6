// ============================================================================
// 业务层：纯 Rust 核心逻辑
// ✅ 特点：不依赖展示层，保持纯净，方便写 #[test]
// ⛔ 禁止：直接返回展示层专用的错误格式
// ============================================================================

pub mod persistence;
pub mod stats;
pub mod store;
