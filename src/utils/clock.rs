// ============================================================================
// 时钟与时间戳
// 所有时间戳均为 UTC 的 RFC 3339（ISO-8601）字符串
// ============================================================================

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::utils::error::{AppError, AppResult};

/// 时间来源 trait
///
/// Store 通过它获取当前时间，测试中可替换为手动时钟。
pub trait Clock: Send {
    fn now(&self) -> OffsetDateTime;
}

/// 系统时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// 将时间格式化为 RFC 3339 字符串
pub fn format_timestamp(ts: OffsetDateTime) -> AppResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| AppError::TimestampError(e.to_string()))
}

/// 解析 RFC 3339 字符串，无法解析时返回 None
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

/// 计算严格晚于 `previous` 的时间戳
///
/// 时钟回拨或精度不足时，在上一次的基础上加 1 微秒。
/// `previous` 无法解析时直接使用 `now`。
pub fn strictly_after(now: OffsetDateTime, previous: &str) -> OffsetDateTime {
    match parse_timestamp(previous) {
        Some(prev) if prev >= now => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// 手动推进的时钟，测试专用
#[cfg(test)]
#[derive(Clone)]
pub struct ManualClock {
    current: std::sync::Arc<std::sync::Mutex<OffsetDateTime>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn starting_at(ts: OffsetDateTime) -> Self {
        ManualClock {
            current: std::sync::Arc::new(std::sync::Mutex::new(ts)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap();
        *current += by;
    }

    pub fn set(&self, ts: OffsetDateTime) {
        *self.current.lock().unwrap() = ts;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.current.lock().unwrap()
    }
}
