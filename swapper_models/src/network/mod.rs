pub mod client_rate_limit;
pub mod http;

use std::{num::NonZeroU32, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitWindow {
    PerSecond(NonZeroU32),
    PerMinute(NonZeroU32),
    Custom { period: Duration },
}

impl RateLimitWindow {
    /// - `<n>s` → PerSecond(n)
    /// - `<n>m` → PerMinute(n)
    /// - `<n>h` → one request every `n` hours
    pub fn from_string(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() < 2 {
            return None;
        }

        let (num_str, unit) = s.split_at(s.len() - 1);
        let number = NonZeroU32::new(num_str.parse().ok()?)?;

        match unit {
            "s" => Some(RateLimitWindow::PerSecond(number)),
            "m" => Some(RateLimitWindow::PerMinute(number)),
            "h" => Some(RateLimitWindow::Custom {
                period: Duration::from_secs(u64::from(number.get()) * 3600),
            }),
            _ => None,
        }
    }
}
