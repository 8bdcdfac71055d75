// =============================================================================
// Signal Book — confirmed signals, histories and the global pending slot
// =============================================================================
//
// Life-cycle of the single pending slot (shared by all assets):
//   Idle  --observe(A, s)-->  Pending(A, s, expires_at)  --confirm-->  Idle
//
// - observe: actionable s, s != confirmed[A], slot empty -> open pending and
//   log UPCOMING. Busy slot -> detection dropped (not queued, no reset).
// - confirm: the only writer of confirmed[A]; logs EXECUTED, frees the slot.
//   Driven by the timer task, and by queries that arrive after expiry.
//
// The book is plain data; `AppState` keeps it behind one mutex so requests
// and the timer never race on the slot.
// =============================================================================

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Local};
use tracing::{debug, info};
use uuid::Uuid;

use crate::runtime_config::RuntimeConfig;
use crate::signals::{AssetHistoryLog, HistoryEvent, PendingSignal};
use crate::types::Signal;

/// Per-instrument state, alive for the whole process.
#[derive(Debug, Clone)]
pub struct AssetState {
    /// Last signal that completed its pending window.
    pub confirmed: Option<Signal>,
    pub history: AssetHistoryLog,
}

/// Result of feeding one detection into the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// A new pending signal was opened; the caller schedules its timer.
    Started(PendingSignal),
    /// The slot is held by `holder`; the detection is discarded.
    Dropped { holder: String },
    /// NONE, already confirmed, or an unknown asset.
    Ignored,
}

pub struct SignalBook {
    order: Vec<String>,
    assets: HashMap<String, AssetState>,
    pending: Option<PendingSignal>,
    selected: String,
    pending_delay_secs: u64,
}

impl SignalBook {
    pub fn new(config: &RuntimeConfig) -> Self {
        let order = config.asset_names();
        let assets = order
            .iter()
            .map(|name| {
                let state = AssetState {
                    confirmed: None,
                    history: AssetHistoryLog::new(config.history_capacity),
                };
                (name.clone(), state)
            })
            .collect();

        Self {
            order,
            assets,
            pending: None,
            selected: config.default_asset.clone(),
            pending_delay_secs: config.pending_delay_secs,
        }
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn is_known(&self, asset: &str) -> bool {
        self.assets.contains_key(asset)
    }

    /// Asset served when a query does not name one.
    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Remember `asset` as the current selection. Returns `false` (and keeps
    /// the old selection) for unknown names.
    pub fn select(&mut self, asset: &str) -> bool {
        if !self.is_known(asset) {
            return false;
        }
        if self.selected != asset {
            debug!(asset, "selected asset changed");
            self.selected = asset.to_string();
        }
        true
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Feed the latest detection for `asset` into the state machine.
    pub fn observe(&mut self, asset: &str, signal: Signal, now: DateTime<Local>) -> Observation {
        if !signal.is_actionable() {
            return Observation::Ignored;
        }

        let Some(state) = self.assets.get_mut(asset) else {
            return Observation::Ignored;
        };
        if state.confirmed == Some(signal) {
            return Observation::Ignored;
        }

        if let Some(holder) = &self.pending {
            debug!(
                asset,
                signal = %signal,
                holder = %holder.asset,
                "pending slot busy, detection dropped"
            );
            return Observation::Dropped {
                holder: holder.asset.clone(),
            };
        }

        let delay = Duration::seconds(self.pending_delay_secs as i64);
        let pending = PendingSignal::new(asset, signal, now, delay);
        state
            .history
            .push(HistoryEvent::upcoming(now, signal, self.pending_delay_secs));

        info!(
            asset,
            signal = %signal,
            id = %pending.id,
            expires_at = %pending.expires_at.format("%H:%M:%S"),
            "signal pending"
        );

        self.pending = Some(pending.clone());
        Observation::Started(pending)
    }

    /// Execute the pending signal identified by `id`.
    ///
    /// Returns the executed pending, or `None` if the slot is empty or holds
    /// a different pending.
    pub fn confirm(&mut self, id: Uuid, now: DateTime<Local>) -> Option<PendingSignal> {
        if self.pending.as_ref().map(|p| p.id) != Some(id) {
            return None;
        }
        let pending = self.pending.take()?;

        if let Some(state) = self.assets.get_mut(&pending.asset) {
            state.confirmed = Some(pending.signal);
            state
                .history
                .push(HistoryEvent::executed(now, pending.signal));
        }

        info!(
            asset = %pending.asset,
            signal = %pending.signal,
            id = %pending.id,
            "signal executed"
        );

        Some(pending)
    }

    /// Execute the pending signal if its window has elapsed by `now`.
    pub fn confirm_expired(&mut self, now: DateTime<Local>) -> Option<PendingSignal> {
        let id = self.pending.as_ref().filter(|p| p.is_expired(now))?.id;
        self.confirm(id, now)
    }

    // ── Read side ───────────────────────────────────────────────────────

    pub fn pending(&self) -> Option<&PendingSignal> {
        self.pending.as_ref()
    }

    /// The pending signal if `asset` holds the slot.
    pub fn pending_for(&self, asset: &str) -> Option<&PendingSignal> {
        self.pending.as_ref().filter(|p| p.asset == asset)
    }

    pub fn confirmed(&self, asset: &str) -> Option<Signal> {
        self.assets.get(asset).and_then(|s| s.confirmed)
    }

    /// Pending signal if this asset holds the slot, else the confirmed
    /// signal, else NONE.
    pub fn displayed_signal(&self, asset: &str) -> Signal {
        self.pending_for(asset)
            .map(|p| p.signal)
            .or_else(|| self.confirmed(asset))
            .unwrap_or_default()
    }

    /// Seconds until the pending signal executes, only for the slot holder.
    pub fn countdown(&self, asset: &str, now: DateTime<Local>) -> Option<u64> {
        self.pending_for(asset).map(|p| p.remaining_secs(now))
    }

    /// Rendered history for one asset, newest first.
    pub fn history(&self, asset: &str) -> Vec<String> {
        self.assets
            .get(asset)
            .map(|s| s.history.lines())
            .unwrap_or_default()
    }

    /// Rendered history for every asset.
    pub fn all_histories(&self) -> BTreeMap<String, Vec<String>> {
        self.assets
            .iter()
            .map(|(name, s)| (name.clone(), s.history.lines()))
            .collect()
    }

    /// Display names in configured order.
    pub fn asset_names(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EUR: &str = "EUR/USD";
    const GBP: &str = "GBP/USD";

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 3, 10, 15, 0).unwrap()
    }

    fn secs(n: i64) -> DateTime<Local> {
        t0() + Duration::seconds(n)
    }

    fn book() -> SignalBook {
        SignalBook::new(&RuntimeConfig::default())
    }

    fn started(obs: Observation) -> PendingSignal {
        match obs {
            Observation::Started(p) => p,
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn fresh_book_shows_none() {
        let b = book();
        assert_eq!(b.displayed_signal(EUR), Signal::None);
        assert_eq!(b.countdown(EUR, t0()), None);
        assert!(b.history(EUR).is_empty());
        assert_eq!(b.all_histories().len(), 5);
        assert_eq!(b.selected(), EUR);
    }

    #[test]
    fn none_detection_is_ignored() {
        let mut b = book();
        assert_eq!(b.observe(EUR, Signal::None, t0()), Observation::Ignored);
        assert!(b.pending().is_none());
    }

    #[test]
    fn unknown_asset_is_ignored() {
        let mut b = book();
        assert_eq!(b.observe("XAU/USD", Signal::Buy, t0()), Observation::Ignored);
        assert!(b.pending().is_none());
    }

    #[test]
    fn new_signal_opens_pending_with_upcoming_entry() {
        let mut b = book();
        let p = started(b.observe(EUR, Signal::Buy, t0()));
        assert_eq!(p.asset, EUR);
        assert_eq!(p.expires_at, secs(20));
        assert_eq!(b.displayed_signal(EUR), Signal::Buy);
        assert_eq!(b.countdown(EUR, secs(5)), Some(15));
        assert_eq!(b.confirmed(EUR), None);
        assert_eq!(b.history(EUR), vec!["10:15:00 - UPCOMING BUY (20s)"]);
    }

    #[test]
    fn requery_of_pending_asset_does_not_reset_or_duplicate() {
        let mut b = book();
        let first = started(b.observe(EUR, Signal::Buy, t0()));
        assert_eq!(
            b.observe(EUR, Signal::Buy, secs(10)),
            Observation::Dropped { holder: EUR.into() }
        );
        assert_eq!(b.pending().unwrap().id, first.id);
        assert_eq!(b.pending().unwrap().expires_at, secs(20));
        assert_eq!(b.history(EUR).len(), 1);
    }

    #[test]
    fn second_asset_is_dropped_while_slot_busy() {
        let mut b = book();
        started(b.observe(EUR, Signal::Buy, t0()));
        assert_eq!(
            b.observe(GBP, Signal::Buy, t0()),
            Observation::Dropped { holder: EUR.into() }
        );
        assert_eq!(b.confirmed(GBP), None);
        assert!(b.history(GBP).is_empty());
        assert_eq!(b.displayed_signal(GBP), Signal::None);
        assert_eq!(b.countdown(GBP, t0()), None);
    }

    #[test]
    fn at_most_one_pending_across_many_detections() {
        let mut b = book();
        let assets = b.asset_names().to_vec();
        let mut opened = 0;
        for round in 0..4 {
            for (i, a) in assets.iter().enumerate() {
                let s = if (round + i) % 2 == 0 { Signal::Buy } else { Signal::Sell };
                if let Observation::Started(_) = b.observe(a, s, secs(round as i64)) {
                    opened += 1;
                }
            }
        }
        assert_eq!(opened, 1);
        let holders = assets.iter().filter(|a| b.pending_for(a).is_some()).count();
        assert_eq!(holders, 1);
    }

    #[test]
    fn confirm_executes_exactly_once_and_frees_slot() {
        let mut b = book();
        let p = started(b.observe(EUR, Signal::Sell, t0()));

        let done = b.confirm(p.id, secs(20)).unwrap();
        assert_eq!(done.signal, Signal::Sell);
        assert_eq!(b.confirmed(EUR), Some(Signal::Sell));
        assert!(b.pending().is_none());
        assert_eq!(b.countdown(EUR, secs(20)), None);

        // A second firing of the same timer is a no-op.
        assert!(b.confirm(p.id, secs(21)).is_none());

        let executed = b
            .history(EUR)
            .iter()
            .filter(|l| l.contains("EXECUTED"))
            .count();
        assert_eq!(executed, 1);
        assert_eq!(b.history(EUR)[0], "10:15:20 - EXECUTED SELL");
    }

    #[test]
    fn stale_id_does_not_confirm_current_pending() {
        let mut b = book();
        let first = started(b.observe(EUR, Signal::Buy, t0()));
        b.confirm(first.id, secs(20));
        let second = started(b.observe(GBP, Signal::Sell, secs(30)));

        assert!(b.confirm(first.id, secs(31)).is_none());
        assert_eq!(b.pending().unwrap().id, second.id);
        assert_eq!(b.confirmed(GBP), None);
    }

    #[test]
    fn confirmed_signal_is_not_reopened() {
        let mut b = book();
        let p = started(b.observe(EUR, Signal::Buy, t0()));
        b.confirm(p.id, secs(20));
        assert_eq!(b.observe(EUR, Signal::Buy, secs(30)), Observation::Ignored);
        assert!(b.pending().is_none());

        // A flip does open a new pending.
        let flip = started(b.observe(EUR, Signal::Sell, secs(40)));
        assert_eq!(flip.signal, Signal::Sell);
        assert_eq!(b.displayed_signal(EUR), Signal::Sell);
        assert_eq!(b.confirmed(EUR), Some(Signal::Buy));
    }

    #[test]
    fn revert_before_expiry_still_executes_pending() {
        let mut b = book();
        let buy = started(b.observe(EUR, Signal::Buy, t0()));
        b.confirm(buy.id, secs(20));

        let sell = started(b.observe(EUR, Signal::Sell, secs(30)));
        // Detection reverts to the confirmed BUY: nothing new is opened...
        assert_eq!(b.observe(EUR, Signal::Buy, secs(35)), Observation::Ignored);
        // ...and the running SELL still lands.
        b.confirm(sell.id, secs(50));
        assert_eq!(b.confirmed(EUR), Some(Signal::Sell));
    }

    #[test]
    fn confirm_expired_waits_for_deadline() {
        let mut b = book();
        started(b.observe(EUR, Signal::Buy, t0()));
        assert!(b.confirm_expired(secs(19)).is_none());
        assert!(b.pending().is_some());
        assert!(b.confirm_expired(secs(20)).is_some());
        assert_eq!(b.confirmed(EUR), Some(Signal::Buy));
    }

    #[test]
    fn query_past_expiry_reports_execution() {
        let mut b = book();
        started(b.observe(EUR, Signal::Buy, t0()));

        let now = secs(25);
        b.confirm_expired(now);
        assert_eq!(b.displayed_signal(EUR), Signal::Buy);
        assert_eq!(b.confirmed(EUR), Some(Signal::Buy));
        assert_eq!(b.countdown(EUR, now), None);
        assert_eq!(b.history(EUR)[0], "10:15:25 - EXECUTED BUY");
    }

    #[test]
    fn two_assets_same_instant_only_one_pending() {
        let mut b = book();
        let first = b.observe(EUR, Signal::Buy, t0());
        let second = b.observe(GBP, Signal::Buy, t0());
        assert!(matches!(first, Observation::Started(_)));
        assert_eq!(second, Observation::Dropped { holder: EUR.into() });

        // Once the slot frees, GBP can go pending on its next detection.
        let id = b.pending().unwrap().id;
        b.confirm(id, secs(20));
        assert!(matches!(b.observe(GBP, Signal::Buy, secs(21)), Observation::Started(_)));
    }

    #[test]
    fn history_is_bounded_per_asset() {
        let mut b = book();
        for i in 0..13 {
            let s = if i % 2 == 0 { Signal::Buy } else { Signal::Sell };
            let p = started(b.observe(EUR, s, secs(i * 30)));
            b.confirm(p.id, secs(i * 30 + 20));
        }
        // 13 cycles x 2 events = 26 pushes, capped at 20.
        assert_eq!(b.history(EUR).len(), 20);
        assert!(b.history(EUR)[0].contains("EXECUTED BUY"));
        assert!(b.history(GBP).is_empty());
    }

    #[test]
    fn select_rejects_unknown_names() {
        let mut b = book();
        assert!(b.select(GBP));
        assert_eq!(b.selected(), GBP);
        assert!(!b.select("DOGE/USD"));
        assert_eq!(b.selected(), GBP);
    }
}
