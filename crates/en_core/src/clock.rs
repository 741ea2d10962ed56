use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

/// Days a stored article is kept before the retention sweep removes it.
pub const RETENTION_DAYS: i64 = 7;

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Asia/Tokyo. Japan has no daylight saving time, so a fixed offset is exact.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Oldest `scraped_at` that survives a retention sweep run at `now`.
pub fn retention_cutoff(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now - Duration::days(RETENTION_DAYS)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock expressed in Japan Standard Time.
#[derive(Debug, Clone, Copy, Default)]
pub struct JstClock;

impl Clock for JstClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&jst())
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
