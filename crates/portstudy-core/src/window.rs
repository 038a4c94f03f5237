use std::collections::VecDeque;

/// Fixed-capacity FIFO of answer outcomes. Pushing past capacity drops the
/// oldest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedWindow {
    entries: VecDeque<bool>,
    capacity: usize,
}

pub type AccuracyWindow = BoundedWindow;

impl BoundedWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from oldest-first outcomes, keeping only the newest `capacity`.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = bool>, capacity: usize) -> Self {
        let mut window = Self::new(capacity);
        window.extend(outcomes);
        window
    }

    pub fn push(&mut self, outcome: bool) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(outcome);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn correct(&self) -> usize {
        self.entries.iter().filter(|&&ok| ok).count()
    }

    /// Rolling accuracy in percent; 0 for an empty window.
    pub fn accuracy(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.correct() as f64 * 100.0 / self.entries.len() as f64
    }

    /// `accuracy >= percent`, computed on integer counts.
    pub fn meets(&self, percent: u32) -> bool {
        let len = self.entries.len() as u64;
        if len == 0 {
            return percent == 0;
        }
        self.correct() as u64 * 100 >= percent as u64 * len
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = bool> + ExactSizeIterator + '_ {
        self.entries.iter().copied()
    }
}

impl Extend<bool> for BoundedWindow {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for outcome in iter {
            self.push(outcome);
        }
    }
}

/// Run of qualifying correct answers. Only its length matters, so it is a
/// counter; on disk it is still a sequence of `true` entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakWindow {
    len: usize,
}

impl StreakWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_len(len: usize) -> Self {
        Self { len }
    }

    pub fn extend_one(&mut self) {
        self.len += 1;
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn outcomes(&self) -> impl Iterator<Item = bool> {
        std::iter::repeat(true).take(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut w = BoundedWindow::new(3);
        w.extend([false, true, true]);
        w.push(true);
        assert_eq!(w.len(), 3);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![true, true, true]);
    }

    #[test]
    fn test_empty_accuracy_is_zero() {
        let w = BoundedWindow::new(10);
        assert_eq!(w.accuracy(), 0.0);
        assert!(!w.meets(75));
    }

    #[test]
    fn test_meets_uses_exact_counts() {
        // 3/4 = 75% exactly
        let w = BoundedWindow::from_outcomes([true, true, true, false], 10);
        assert!(w.meets(75));
        assert!(!w.meets(76));

        // 2/3 = 66.66..%
        let w = BoundedWindow::from_outcomes([true, true, false], 10);
        assert!(w.meets(66));
        assert!(!w.meets(67));
    }

    #[test]
    fn test_from_outcomes_keeps_newest() {
        let w = BoundedWindow::from_outcomes([false, false, true, true], 2);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![true, true]);
        assert_eq!(w.capacity(), 2);
    }

    #[test]
    fn test_streak_counter() {
        let mut s = StreakWindow::new();
        s.extend_one();
        s.extend_one();
        assert_eq!(s.len(), 2);
        assert_eq!(s.outcomes().collect::<Vec<_>>(), vec![true, true]);
        s.reset();
        assert!(s.is_empty());
    }
}
