// ============================================================================
// 标识符生成
// ============================================================================

use uuid::Uuid;

/// 生成一个新的不透明标识符（UUID v4 字符串）
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// 生成一个不与任何已存在 ID 冲突的新标识符
///
/// `is_taken` 返回 true 表示该 ID 已被占用，需要重新生成。
pub fn unique_id(is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = new_id();
        if !is_taken(&id) {
            return id;
        }
        log::debug!("标识符冲突，重新生成：{}", id);
    }
}
