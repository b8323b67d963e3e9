//! Navigation coordinator
//!
//! Saves per-route scroll state before the user leaves a route and converges
//! the viewport back onto it when they return. Page components call the
//! lifecycle methods; the host forwards scroll/unload events and drives time
//! through `advance_to`.
//!
//! No failure escapes: storage, viewport and router errors are logged and
//! turn into "not saved" / "not restored".

use crate::config::CoordinatorConfig;
use crate::persistence::{SessionStore, StateStore};
use crate::platform::{Clock, Router, ScrollBehavior, SystemClock, Viewport};
use crate::restore::{
    DebouncedWriter, RestorationScheduler, RestorePhase, RestoreToken, SuppressionGate, Task,
    TimerId, TimerQueue, correction,
};
use crate::state::NavigationState;

/// Root route used when going back with no history and no fallback
pub const ROOT_PATH: &str = "/";

/// Options for `navigate_with_save`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    /// Save the current route's state first
    pub preserve_scroll: bool,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            replace: false,
            preserve_scroll: true,
        }
    }
}

/// Options for `navigate_back_with_state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackOptions {
    /// Save the current route's state first
    pub preserve_scroll: bool,
    /// Drop the current route's stored state before leaving
    pub reset_state: bool,
}

impl Default for BackOptions {
    fn default() -> Self {
        Self {
            preserve_scroll: true,
            reset_state: false,
        }
    }
}

/// Owns the persisted state, the suppression gate and every pending timer
pub struct NavigationCoordinator<S, V, R> {
    config: CoordinatorConfig,
    store: StateStore<S>,
    viewport: V,
    router: R,
    clock: Box<dyn Clock>,
    timers: TimerQueue<Task>,
    gate: SuppressionGate,
    writer: DebouncedWriter,
    scheduler: RestorationScheduler,
    /// Re-restore queued by an in-page state change
    rerestore: Option<TimerId>,
    /// Whether the current mount restored saved state
    has_restored: bool,
}

impl<S: SessionStore, V: Viewport, R: Router> NavigationCoordinator<S, V, R> {
    pub fn new(store: S, viewport: V, router: R, config: CoordinatorConfig) -> Self {
        Self {
            store: StateStore::new(store, config.history_capacity),
            viewport,
            router,
            clock: Box::new(SystemClock),
            timers: TimerQueue::new(),
            gate: SuppressionGate::new(),
            writer: DebouncedWriter::new(config.debounce_ms),
            scheduler: RestorationScheduler::from_config(&config),
            rerestore: None,
            has_restored: false,
            config,
        }
    }

    /// Use `clock` for record timestamps
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // === Accessors ===

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.store.inner_mut()
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn phase(&self) -> RestorePhase {
        self.gate.phase()
    }

    pub fn is_restoring(&self) -> bool {
        self.gate.is_active()
    }

    /// Whether the latest `mount` found state to restore
    pub fn has_restored(&self) -> bool {
        self.has_restored
    }

    /// Whether a debounced save is waiting for its window to elapse
    pub fn has_pending_save(&self) -> bool {
        self.writer.is_pending()
    }

    /// Saved offset for `path`, read from the first usable representation
    pub fn saved_offset(&self, path: &str) -> Option<u32> {
        self.store.read_offset(path)
    }

    /// Full saved record for `path`, if one survives
    pub fn saved_state(&self, path: &str) -> Option<NavigationState> {
        self.store.read_record(path)
    }

    // === Saving ===

    /// Snapshot the viewport into every storage representation for `path`.
    ///
    /// Returns true when the record was fully written. Dropped while a
    /// restoration is in flight.
    pub fn save(&mut self, path: &str) -> bool {
        if self.gate.is_active() {
            log::debug!("Save of {} suppressed during restoration", path);
            return false;
        }

        let metrics = match self.viewport.metrics() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Cannot save {}: {}", path, e);
                return false;
            }
        };
        let state = NavigationState::new(
            path,
            metrics.scroll_offset,
            metrics.viewport_height,
            metrics.document_height,
            self.clock.now_ms(),
        );

        let report = self.store.write(&state);
        for (repr, e) in &report.failed {
            log::warn!("Skipped {} save for {}: {}", repr.as_str(), path, e);
        }
        if report.is_complete() {
            log::debug!("Saved {} at offset {}", path, state.scroll_position);
        }
        report.is_complete()
    }

    /// Save the route currently shown
    pub fn save_current(&mut self) -> bool {
        let path = self.router.current_path();
        self.save(&path)
    }

    /// Save `path` once scrolling has been quiet for the debounce window
    pub fn request_save(&mut self, path: &str) {
        if self.gate.is_active() {
            return;
        }
        self.writer
            .request(&mut self.timers, path, |seq| Task::FlushSave { seq });
    }

    /// Save `path` right away, dropping any pending debounced save
    pub fn save_now(&mut self, path: &str) -> bool {
        self.writer.cancel(&mut self.timers);
        self.save(path)
    }

    // === Restoring ===

    /// Start converging the viewport onto the saved offset for `path`
    /// (default: the current route).
    ///
    /// Returns whether a saved offset existed and a sequence was started, not
    /// whether the final position matched. Any sequence already in flight is
    /// cancelled first.
    pub fn restore(&mut self, path: Option<&str>) -> bool {
        let path = path
            .map(str::to_string)
            .unwrap_or_else(|| self.router.current_path());

        let Some(offset) = self.store.read_offset(&path) else {
            log::debug!("No saved state for {}", path);
            return false;
        };

        if let Some(previous) = self.scheduler.active_path() {
            log::debug!("Restoration of {} superseded by {}", previous, path);
        }
        let token = self.gate.begin();
        self.scheduler.start(&mut self.timers, token, &path, offset);
        log::info!(
            "Restoring {} to offset {} ({} attempts over {} ms)",
            path,
            offset,
            self.scheduler.attempt_count(),
            self.config.restoration_window_ms()
        );
        true
    }

    /// A route finished mounting: restore it, or start at the top if it has
    /// no saved state.
    pub fn mount(&mut self, path: &str) -> bool {
        self.cancel_route_timers();
        self.abort_restoration();
        self.has_restored = false;
        if !self.config.restore_on_mount {
            return false;
        }

        self.has_restored = self.restore(Some(path));
        if !self.has_restored {
            if let Err(e) = self.viewport.scroll_to(0, ScrollBehavior::Instant) {
                log::debug!("Scroll to top of {} failed: {}", path, e);
            }
        }
        self.has_restored
    }

    /// Stop the sequence in flight and reopen the gate
    fn abort_restoration(&mut self) {
        if let RestorePhase::Restoring { token } = self.gate.phase() {
            self.scheduler.cancel(&mut self.timers);
            self.gate.release(token);
        }
    }

    fn run_attempt(&mut self, token: RestoreToken, index: usize, offset: u32) {
        if !self.gate.is_current(token) {
            return;
        }

        match self.viewport.metrics() {
            Ok(metrics) => {
                if let Some(target) = correction(&metrics, offset, self.scheduler.deadband()) {
                    match self.viewport.scroll_to(target, ScrollBehavior::Instant) {
                        Ok(()) => log::debug!(
                            "Attempt {}: {} -> {} (saved {})",
                            index,
                            metrics.scroll_offset,
                            target,
                            offset
                        ),
                        Err(e) => log::debug!("Attempt {} scroll failed: {}", index, e),
                    }
                }
            }
            Err(e) => log::debug!("Attempt {} skipped: {}", index, e),
        }

        if self.scheduler.is_last(index) {
            self.scheduler.schedule_release(&mut self.timers, token);
        }
    }

    // === Navigation ===

    /// Navigate to `path`, saving the current route first unless told not to.
    ///
    /// Returns whether the router accepted the navigation.
    pub fn navigate_with_save(&mut self, path: &str, options: NavigateOptions) -> bool {
        self.cancel_route_timers();
        if options.preserve_scroll {
            self.save_current();
        }

        let result = if options.replace {
            self.router.replace(path)
        } else {
            self.router.push(path)
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Navigation to {} failed: {}", path, e);
                false
            }
        }
    }

    /// Go back one history entry, else to `fallback`, else to the root.
    pub fn navigate_back_with_state(&mut self, fallback: Option<&str>, options: BackOptions) -> bool {
        let current = self.router.current_path();
        self.cancel_route_timers();
        if options.preserve_scroll {
            self.save(&current);
        }
        if options.reset_state {
            self.forget(&current);
        }

        if self.router.history_len() > 1 {
            match self.router.back() {
                Ok(()) => return true,
                Err(e) => log::debug!("Back navigation unavailable: {}", e),
            }
        }

        let target = fallback.unwrap_or(ROOT_PATH);
        match self.router.push(target) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Fallback navigation to {} failed: {}", target, e);
                false
            }
        }
    }

    /// In-page view change (panel collapsed, tab switched) without a route
    /// change: save, apply `reset`, then restore once the new layout settles.
    pub fn handle_internal_state_change<F: FnOnce(&mut V)>(&mut self, reset: F) {
        let path = self.router.current_path();
        self.save(&path);
        reset(&mut self.viewport);
        if let Some(previous) = self.rerestore.take() {
            self.timers.cancel(previous);
        }
        let id = self
            .timers
            .schedule(self.config.internal_change_delay_ms, Task::Rerestore { path });
        self.rerestore = Some(id);
    }

    /// Drop deferred work bound to the route being left. A debounced save
    /// firing after the switch would read the next page's viewport.
    fn cancel_route_timers(&mut self) {
        if let Some(path) = self.writer.cancel(&mut self.timers) {
            log::debug!("Dropped pending save of {} on route change", path);
        }
        if let Some(id) = self.rerestore.take() {
            self.timers.cancel(id);
        }
    }

    /// Scroll straight to `offset`
    pub fn scroll_to(&mut self, offset: u32, behavior: ScrollBehavior) -> bool {
        match self.viewport.scroll_to(offset, behavior) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Scroll to {} failed: {}", offset, e);
                false
            }
        }
    }

    // === Cleanup ===

    /// Drop every stored representation for `path`
    pub fn forget(&mut self, path: &str) -> bool {
        self.store.forget(path).is_ok()
    }

    /// Remove all navigation state from the session store.
    ///
    /// Returns how many keys were removed.
    pub fn purge_all(&mut self) -> usize {
        match self.store.purge_all() {
            Ok(removed) => {
                log::info!("Purged {} navigation state keys", removed);
                removed
            }
            Err(e) => {
                log::warn!("Purge failed: {}", e);
                0
            }
        }
    }

    // === Host events ===

    /// Viewport scrolled
    pub fn on_scroll(&mut self) {
        if self.config.save_on_scroll {
            let path = self.router.current_path();
            self.request_save(&path);
        }
    }

    /// Page is being torn down; no further events will arrive
    pub fn on_unload(&mut self) {
        if self.config.save_on_unload {
            let path = self.router.current_path();
            self.save_now(&path);
        }
    }

    // === Time ===

    /// Current coordinator time (ms)
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// When the host should next call `advance_to`
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Run every task due up to `now`, including tasks they schedule
    pub fn advance_to(&mut self, now: u64) {
        while let Some(task) = self.timers.pop_due(now) {
            self.run_task(task);
        }
        self.timers.set_now(now);
    }

    pub fn advance_by(&mut self, ms: u64) {
        let target = self.timers.now().saturating_add(ms);
        self.advance_to(target);
    }

    /// Advance until nothing is pending
    pub fn run_until_idle(&mut self) {
        while let Some(deadline) = self.timers.next_deadline() {
            self.advance_to(deadline);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::FlushSave { seq } => {
                if let Some(path) = self.writer.fire(seq) {
                    self.save(&path);
                }
            }
            Task::Attempt {
                token,
                index,
                offset,
            } => self.run_attempt(token, index, offset),
            Task::ReleaseGate { token } => {
                if self.gate.release(token) {
                    self.scheduler.finish();
                    log::debug!("Restoration finished, saving resumed");
                }
            }
            Task::Rerestore { path } => {
                self.rerestore = None;
                self.restore(Some(&path));
            }
        }
    }
}
