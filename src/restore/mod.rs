//! Restoration machinery
//!
//! - `timer`: host-driven delayed tasks
//! - `gate`: the Idle/Restoring suppression state machine
//! - `debounce`: cancel-and-replace save requests
//! - `scheduler`: the graduated sequence of scroll corrections

pub mod debounce;
pub mod gate;
pub mod scheduler;
pub mod timer;

pub use debounce::DebouncedWriter;
pub use gate::{RestorePhase, RestoreToken, SuppressionGate};
pub use scheduler::{RestorationScheduler, correction};
pub use timer::{TimerId, TimerQueue};

/// Work the coordinator defers to a later tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Debounced save whose quiescence window elapsed
    FlushSave { seq: u64 },
    /// One scroll correction of a restoration sequence
    Attempt {
        token: RestoreToken,
        index: usize,
        offset: u32,
    },
    /// End of a restoration sequence
    ReleaseGate { token: RestoreToken },
    /// Restore again after an in-page view change
    Rerestore { path: String },
}
