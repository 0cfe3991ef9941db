//! Per-message-type duplicate suppression.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// How long repeated messages of one type are suppressed after one of them
/// has been processed.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Suppression windows keyed per message type, so unrelated types never
/// block each other. The map is pruned lazily on each admit call; there is
/// no background cleanup task, and the map is bounded by the number of
/// distinct message types seen inside one window.
#[derive(Debug)]
pub struct DebounceFilter {
    window: Duration,
    suppress_until: HashMap<&'static str, Instant>,
}

impl DebounceFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            suppress_until: HashMap::new(),
        }
    }

    /// Whether a message of this kind should be processed now. Admitting a
    /// kind starts its suppression window; duplicates inside the window
    /// answer false and leave the window as it was.
    pub fn admit(&mut self, kind: &'static str, now: Instant) -> bool {
        self.suppress_until.retain(|_, until| *until > now);
        if self.suppress_until.contains_key(kind) {
            return false;
        }
        self.suppress_until.insert(kind, now + self.window);
        true
    }

    /// Forget all suppression state, e.g. on session teardown.
    pub fn clear(&mut self) {
        self.suppress_until.clear();
    }
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_within_window_is_suppressed() {
        let mut f = DebounceFilter::default();
        let t0 = Instant::now();
        assert!(f.admit("PLAYERS_INFO", t0));
        assert!(!f.admit("PLAYERS_INFO", t0 + Duration::from_millis(500)));
        assert!(!f.admit("PLAYERS_INFO", t0 + Duration::from_millis(999)));
    }

    #[test]
    fn window_expiry_readmits() {
        let mut f = DebounceFilter::default();
        let t0 = Instant::now();
        assert!(f.admit("NEXT_TURN", t0));
        assert!(f.admit("NEXT_TURN", t0 + Duration::from_millis(1001)));
    }

    #[test]
    fn kinds_are_independent() {
        let mut f = DebounceFilter::default();
        let t0 = Instant::now();
        assert!(f.admit("NEXT_TURN", t0));
        assert!(f.admit("DECK_UPDATE", t0));
        assert!(f.admit("PLAYERS_INFO", t0));
        assert!(!f.admit("NEXT_TURN", t0 + Duration::from_millis(10)));
        assert!(f.admit("DECK_UPDATE", t0 + Duration::from_millis(1500)));
    }

    #[test]
    fn clear_resets_everything() {
        let mut f = DebounceFilter::default();
        let t0 = Instant::now();
        assert!(f.admit("NEXT_TURN", t0));
        f.clear();
        assert!(f.admit("NEXT_TURN", t0));
    }
}
