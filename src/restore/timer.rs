//! Host-driven timer queue
//!
//! Nothing here sleeps. The host owns real time: it advances the queue to its
//! own "now" and arms a single host timer for `next_deadline()`.

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    due: u64,
    task: T,
}

/// Deterministic queue of delayed tasks, in milliseconds
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: u64,
    next_id: u64,
    pending: Vec<Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current queue time
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `task` once `delay_ms` has elapsed
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Timer {
            id,
            due: self.now.saturating_add(delay_ms),
            task,
        });
        id
    }

    /// Drop a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|t| t.due).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the earliest task due at or before `until`, moving time to its
    /// deadline. Equal deadlines come out in scheduling order.
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        let (idx, due) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.id.0))
            .map(|(i, t)| (i, t.due))?;
        let timer = self.pending.remove(idx);
        self.now = self.now.max(due);
        Some(timer.task)
    }

    /// Move time forward without running anything. Time never goes back.
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(50, "b");
        q.schedule(0, "a");
        q.schedule(50, "c");

        assert_eq!(q.next_deadline(), Some(0));
        assert_eq!(q.pop_due(100), Some("a"));
        assert_eq!(q.pop_due(100), Some("b"));
        assert_eq!(q.now(), 50);
        assert_eq!(q.pop_due(100), Some("c"));
        assert_eq!(q.pop_due(100), None);
    }

    #[test]
    fn test_pop_due_respects_until() {
        let mut q = TimerQueue::new();
        q.schedule(100, ());
        assert_eq!(q.pop_due(99), None);
        assert_eq!(q.pop_due(100), Some(()));
    }

    #[test]
    fn test_cancel() {
        let mut q = TimerQueue::new();
        let id = q.schedule(10, 1);
        q.schedule(20, 2);
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert_eq!(q.pop_due(u64::MAX), Some(2));
        assert!(q.is_empty());
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let mut q = TimerQueue::new();
        q.set_now(1_000);
        q.schedule(50, ());
        assert_eq!(q.next_deadline(), Some(1_050));

        q.set_now(10);
        assert_eq!(q.now(), 1_000);
    }
}
