// ============================================================================
// 展示层接口：对外暴露的 command 函数
// ============================================================================

pub mod tracker;
