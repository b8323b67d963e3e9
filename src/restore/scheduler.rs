//! Restoration scheduler
//!
//! Content keeps changing height for a while after a route mounts (images,
//! lazy sections, animations). Instead of one early jump that undershoots or
//! one late jump the user can see, the saved offset is re-applied at a few
//! increasing delays, each clamped to the page's live scrollable extent.

use super::Task;
use super::gate::RestoreToken;
use super::timer::{TimerId, TimerQueue};
use crate::config::CoordinatorConfig;
use crate::platform::ViewportMetrics;

/// Offset to jump to for this attempt, or `None` when already close enough
pub fn correction(metrics: &ViewportMetrics, saved: u32, deadband: u32) -> Option<u32> {
    let target = saved.min(metrics.max_extent());
    if metrics.scroll_offset.abs_diff(target) > deadband {
        Some(target)
    } else {
        None
    }
}

/// Schedules and tracks the attempts of the current restoration sequence
#[derive(Debug)]
pub struct RestorationScheduler {
    delays_ms: Vec<u64>,
    deadband: u32,
    release_delay_ms: u64,
    /// Timers of the sequence in flight
    active: Vec<TimerId>,
    active_path: Option<String>,
}

impl RestorationScheduler {
    pub fn new(delays_ms: Vec<u64>, deadband: u32, release_delay_ms: u64) -> Self {
        Self {
            delays_ms,
            deadband,
            release_delay_ms,
            active: Vec::new(),
            active_path: None,
        }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(
            config.attempt_delays_ms.clone(),
            config.deadband_px,
            config.release_delay_ms,
        )
    }

    pub fn deadband(&self) -> u32 {
        self.deadband
    }

    pub fn attempt_count(&self) -> usize {
        self.delays_ms.len()
    }

    /// Path of the sequence in flight
    pub fn active_path(&self) -> Option<&str> {
        self.active_path.as_deref()
    }

    /// Queue every attempt for a new sequence, cancelling the previous one
    pub fn start(
        &mut self,
        timers: &mut TimerQueue<Task>,
        token: RestoreToken,
        path: &str,
        offset: u32,
    ) {
        self.cancel(timers);
        self.active_path = Some(path.to_string());

        if self.delays_ms.is_empty() {
            self.schedule_release(timers, token);
            return;
        }
        for (index, &delay) in self.delays_ms.iter().enumerate() {
            let id = timers.schedule(delay, Task::Attempt { token, index, offset });
            self.active.push(id);
        }
    }

    /// Whether attempt `index` is the final one of the sequence
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.delays_ms.len()
    }

    /// Queue the gate release that ends the sequence
    pub fn schedule_release(&mut self, timers: &mut TimerQueue<Task>, token: RestoreToken) {
        let id = timers.schedule(self.release_delay_ms, Task::ReleaseGate { token });
        self.active.push(id);
    }

    /// Cancel whatever is left of the sequence in flight
    pub fn cancel(&mut self, timers: &mut TimerQueue<Task>) -> bool {
        let had_active = !self.active.is_empty();
        for id in self.active.drain(..) {
            timers.cancel(id);
        }
        self.active_path = None;
        had_active
    }

    /// Forget the finished sequence
    pub fn finish(&mut self) {
        self.active.clear();
        self.active_path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::gate::SuppressionGate;
    use proptest::prelude::*;

    fn metrics(offset: u32, vh: u32, dh: u32) -> ViewportMetrics {
        ViewportMetrics {
            scroll_offset: offset,
            viewport_height: vh,
            document_height: dh,
        }
    }

    #[test]
    fn test_correction_targets_saved_offset() {
        assert_eq!(correction(&metrics(0, 800, 5000), 1200, 5), Some(1200));
    }

    #[test]
    fn test_correction_clamps_to_live_extent() {
        assert_eq!(correction(&metrics(0, 800, 1000), 3000, 5), Some(200));
    }

    #[test]
    fn test_correction_deadband() {
        assert_eq!(correction(&metrics(1196, 800, 5000), 1200, 5), None);
        assert_eq!(correction(&metrics(1205, 800, 5000), 1200, 5), None);
        assert_eq!(correction(&metrics(1206, 800, 5000), 1200, 5), Some(1200));
    }

    #[test]
    fn test_start_queues_every_attempt() {
        let mut timers = TimerQueue::new();
        let mut gate = SuppressionGate::new();
        let mut sched = RestorationScheduler::new(vec![0, 50, 150], 5, 100);

        let token = gate.begin();
        sched.start(&mut timers, token, "/a", 10);
        assert_eq!(timers.len(), sched.attempt_count());
        assert_eq!(sched.active_path(), Some("/a"));
        assert!(sched.is_last(2));
        assert!(!sched.is_last(1));
    }

    #[test]
    fn test_restart_cancels_previous_sequence() {
        let mut timers = TimerQueue::new();
        let mut gate = SuppressionGate::new();
        let mut sched = RestorationScheduler::new(vec![0, 50, 150], 5, 100);

        let first = gate.begin();
        sched.start(&mut timers, first, "/a", 10);
        let second = gate.begin();
        sched.start(&mut timers, second, "/a", 20);

        assert_eq!(timers.len(), 3);
        while let Some(task) = timers.pop_due(u64::MAX) {
            match task {
                Task::Attempt { token, offset, .. } => {
                    assert_eq!(token, second);
                    assert_eq!(offset, 20);
                }
                other => panic!("unexpected task {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_sequence_still_releases() {
        let mut timers = TimerQueue::new();
        let mut gate = SuppressionGate::new();
        let mut sched = RestorationScheduler::new(Vec::new(), 5, 100);

        let token = gate.begin();
        sched.start(&mut timers, token, "/a", 10);
        assert!(matches!(timers.pop_due(100), Some(Task::ReleaseGate { .. })));
    }

    proptest! {
        #[test]
        fn prop_correction_never_exceeds_extent(
            offset in 0u32..20_000,
            saved in 0u32..20_000,
            vh in 1u32..2_000,
            dh in 1u32..20_000,
        ) {
            let m = metrics(offset.min(dh.saturating_sub(vh)), vh, dh);
            if let Some(target) = correction(&m, saved, 5) {
                prop_assert!(target <= m.max_extent());
                prop_assert!(target <= saved);
            }
        }
    }
}
