// =============================================================================
// Pending Signal — a detection waiting out its confirmation window
// =============================================================================

use chrono::{DateTime, Duration, Local};
use serde::Serialize;
use uuid::Uuid;

use crate::types::Signal;

/// The single in-flight signal awaiting confirmation.
///
/// `id` ties a scheduled confirmation timer to the pending it was created
/// for; a timer whose id no longer matches the slot is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSignal {
    pub id: Uuid,
    pub asset: String,
    pub signal: Signal,
    pub created_at: DateTime<Local>,
    pub expires_at: DateTime<Local>,
}

impl PendingSignal {
    pub fn new(asset: impl Into<String>, signal: Signal, now: DateTime<Local>, delay: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset: asset.into(),
            signal,
            created_at: now,
            expires_at: now + delay,
        }
    }

    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left until expiry, truncated and clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Local>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }

    /// Confirmation delay as a std duration, for the timer task.
    pub fn delay(&self) -> std::time::Duration {
        (self.expires_at - self.created_at).to_std().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn expiry_is_creation_plus_delay() {
        let p = PendingSignal::new("EUR/USD", Signal::Buy, t0(), Duration::seconds(20));
        assert_eq!(p.expires_at, t0() + Duration::seconds(20));
        assert_eq!(p.delay(), std::time::Duration::from_secs(20));
    }

    #[test]
    fn remaining_secs_truncates_and_clamps() {
        let p = PendingSignal::new("EUR/USD", Signal::Sell, t0(), Duration::seconds(20));
        assert_eq!(p.remaining_secs(t0()), 20);
        assert_eq!(p.remaining_secs(t0() + Duration::milliseconds(1500)), 18);
        assert_eq!(p.remaining_secs(t0() + Duration::seconds(25)), 0);
    }

    #[test]
    fn expired_at_and_after_deadline() {
        let p = PendingSignal::new("GBP/USD", Signal::Buy, t0(), Duration::seconds(20));
        assert!(!p.is_expired(t0() + Duration::seconds(19)));
        assert!(p.is_expired(t0() + Duration::seconds(20)));
        assert!(p.is_expired(t0() + Duration::seconds(25)));
    }

    #[test]
    fn ids_are_unique() {
        let a = PendingSignal::new("EUR/USD", Signal::Buy, t0(), Duration::seconds(20));
        let b = PendingSignal::new("EUR/USD", Signal::Buy, t0(), Duration::seconds(20));
        assert_ne!(a.id, b.id);
    }
}
