//! Debounced save requests
//!
//! Scroll events arrive far faster than storage should be written. Each
//! request replaces the pending one; only the last request in a quiescence
//! window produces a write.

use super::timer::{TimerId, TimerQueue};

#[derive(Debug)]
struct PendingSave {
    timer: TimerId,
    seq: u64,
    path: String,
}

/// Cancel-and-replace save scheduling
#[derive(Debug)]
pub struct DebouncedWriter {
    window_ms: u64,
    seq: u64,
    pending: Option<PendingSave>,
}

impl DebouncedWriter {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            seq: 0,
            pending: None,
        }
    }

    /// Schedule a save of `path`, replacing any pending one.
    ///
    /// `make_task` builds the queue task from the request's sequence number,
    /// which `fire` later checks.
    pub fn request<T>(
        &mut self,
        timers: &mut TimerQueue<T>,
        path: &str,
        make_task: impl FnOnce(u64) -> T,
    ) {
        self.cancel(timers);
        self.seq += 1;
        let timer = timers.schedule(self.window_ms, make_task(self.seq));
        self.pending = Some(PendingSave {
            timer,
            seq: self.seq,
            path: path.to_string(),
        });
    }

    /// Claim the pending save when its timer fires; stale sequences yield `None`
    pub fn fire(&mut self, seq: u64) -> Option<String> {
        match &self.pending {
            Some(p) if p.seq == seq => self.pending.take().map(|p| p.path),
            _ => None,
        }
    }

    /// Drop the pending save, if any
    pub fn cancel<T>(&mut self, timers: &mut TimerQueue<T>) -> Option<String> {
        let pending = self.pending.take()?;
        timers.cancel(pending.timer);
        Some(pending.path)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_collapse_to_last() {
        let mut timers = TimerQueue::new();
        let mut writer = DebouncedWriter::new(100);

        for path in ["/a", "/b", "/c"] {
            writer.request(&mut timers, path, |seq| seq);
        }
        assert_eq!(timers.len(), 1);

        let seq = timers.pop_due(100).unwrap();
        assert_eq!(writer.fire(seq).as_deref(), Some("/c"));
        assert!(!writer.is_pending());
    }

    #[test]
    fn test_window_restarts_on_each_request() {
        let mut timers = TimerQueue::new();
        let mut writer = DebouncedWriter::new(100);

        writer.request(&mut timers, "/a", |seq| seq);
        timers.set_now(80);
        writer.request(&mut timers, "/a", |seq| seq);

        assert_eq!(timers.pop_due(100), None);
        assert!(timers.pop_due(180).is_some());
    }

    #[test]
    fn test_stale_sequence_is_ignored() {
        let mut timers = TimerQueue::new();
        let mut writer = DebouncedWriter::new(100);
        writer.request(&mut timers, "/a", |seq| seq);
        writer.request(&mut timers, "/a", |seq| seq);
        assert_eq!(writer.fire(1), None);
        assert!(writer.is_pending());
    }

    #[test]
    fn test_cancel_removes_timer() {
        let mut timers = TimerQueue::new();
        let mut writer = DebouncedWriter::new(100);
        writer.request(&mut timers, "/a", |seq| seq);
        assert_eq!(writer.cancel(&mut timers).as_deref(), Some("/a"));
        assert!(timers.is_empty());
    }
}
