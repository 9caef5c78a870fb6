// ============================================================================
// 数据模型：实体与 DTO
// ============================================================================

pub mod dtos;
pub mod entities;
