//! Nav Restore - per-route scroll state persistence for browser clients
//!
//! Core modules:
//! - `state`: Navigation records and the aggregate history map
//! - `persistence`: Session store and the redundant record encodings
//! - `platform`: Viewport/router/clock seams (browser or simulated)
//! - `restore`: Timers, suppression gate, debounced saves, correction scheduling
//! - `coordinator`: The lifecycle API pages call into
//! - `config`: Timing and listener tunables

pub mod config;
pub mod coordinator;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod restore;
pub mod state;

pub use config::CoordinatorConfig;
pub use coordinator::{BackOptions, NavigateOptions, NavigationCoordinator};
pub use error::{CodecError, ConfigError, RouterError, StoreError, ViewportError};
pub use persistence::{MemoryStore, SessionStore};
pub use platform::{Clock, MemoryRouter, Router, ScrollBehavior, SimulatedViewport, Viewport};
pub use state::{HistoryMap, NavigationState};
