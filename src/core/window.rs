//! Time-windowed posture history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One posture classification kept in the window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostureHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub is_correct: bool,
}

/// Posture classifications from the trailing window, oldest first.
///
/// # Example
///
/// ```rust
/// use spinewatch::core::PostureWindow;
/// use chrono::{Duration, Utc};
///
/// let start = Utc::now();
/// let mut window = PostureWindow::new();
/// window.push(start, false);
/// window.push(start + Duration::seconds(200), true);
///
/// window.evict(start + Duration::seconds(350), Duration::seconds(300));
/// assert_eq!(window.len(), 1);
/// assert_eq!(window.incorrect_ratio(), Some(0.0));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostureWindow {
    entries: VecDeque<PostureHistoryEntry>,
}

impl PostureWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: DateTime<Utc>, is_correct: bool) {
        self.entries.push_back(PostureHistoryEntry {
            timestamp,
            is_correct,
        });
    }

    /// Drop every entry older than `window` as seen from `now`.
    ///
    /// An entry exactly `window` old is kept. Returns the number removed.
    pub fn evict(&mut self, now: DateTime<Utc>, window: chrono::Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| now.signed_duration_since(entry.timestamp) <= window);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn incorrect_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_correct).count()
    }

    /// Share of incorrect entries, `None` for an empty window.
    pub fn incorrect_ratio(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.incorrect_count() as f64 / self.entries.len() as f64)
    }

    pub fn oldest(&self) -> Option<&PostureHistoryEntry> {
        self.entries.front()
    }

    pub fn newest(&self) -> Option<&PostureHistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostureHistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn new_window_is_empty() {
        let window = PostureWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.incorrect_ratio(), None);
        assert!(window.oldest().is_none());
    }

    #[test]
    fn entry_exactly_window_old_is_kept() {
        let mut window = PostureWindow::new();
        window.push(t(0), true);
        window.push(t(1), true);

        let removed = window.evict(t(300), Duration::seconds(300));

        assert_eq!(removed, 0);
        assert_eq!(window.len(), 2);

        let removed = window.evict(t(301), Duration::seconds(300));
        assert_eq!(removed, 1);
        assert_eq!(window.oldest().map(|e| e.timestamp), Some(t(1)));
    }

    #[test]
    fn ratio_counts_incorrect_entries() {
        let mut window = PostureWindow::new();
        window.push(t(0), false);
        window.push(t(1), false);
        window.push(t(2), true);
        window.push(t(3), false);

        assert_eq!(window.incorrect_count(), 3);
        assert_eq!(window.incorrect_ratio(), Some(0.75));
    }

    #[test]
    fn entries_stay_in_insertion_order() {
        let mut window = PostureWindow::new();
        for secs in 0..5 {
            window.push(t(secs), secs % 2 == 0);
        }

        let stamps: Vec<_> = window.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, (0..5).map(t).collect::<Vec<_>>());
        assert_eq!(window.newest().map(|e| e.is_correct), Some(true));
    }
}
