use std::time::{SystemTime, UNIX_EPOCH};

pub mod bps;
pub mod evm;
pub mod units;

/// Unix seconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        get_timestamp()
    }
}

/// A quote stays usable strictly before its expiry
pub fn is_expired(expiry: u64, now: u64) -> bool {
    now >= expiry
}
