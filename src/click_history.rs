use std::collections::VecDeque;

/// Sliding-window click-rate detector.
///
/// Owns the click timestamp history for a single widget instance. Every
/// insertion eagerly purges entries that have fallen out of the trailing
/// window, so the buffer never holds more than one window's worth of clicks.
pub struct ClickHistory {
    entries: VecDeque<u64>,
    window_ms: u64,
    spam_threshold: usize,
}

impl ClickHistory {
    pub fn new(window_ms: u64, spam_threshold: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            window_ms,
            spam_threshold,
        }
    }

    /// Record a click at `now_ms` and report whether the in-window click
    /// count has reached the spam threshold.
    ///
    /// Invariant after return: every retained entry satisfies
    /// `now_ms - entry < window_ms`.
    pub fn record_and_check(&mut self, now_ms: u64) -> bool {
        self.entries.push_back(now_ms);

        // Purge entries older than the window. Entries are time-ordered,
        // so everything past the first in-window entry is retained.
        while let Some(&oldest) = self.entries.front() {
            if now_ms.saturating_sub(oldest) >= self.window_ms {
                self.entries.pop_front();
            } else {
                break;
            }
        }

        self.entries.len() >= self.spam_threshold
    }

    /// Current number of clicks inside the trailing window, as of the last
    /// insertion. This is the `click_frequency` feature.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
