use domain::Timestamp;

/// 时钟抽象，便于测试中固定时间。
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// 使用系统 UTC 时间的默认实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now_utc()
    }
}
