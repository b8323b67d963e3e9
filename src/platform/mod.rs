//! Platform abstraction layer
//!
//! The coordinator only talks to the page through these seams:
//! - `Viewport`: scroll offset, heights, and the scroll command
//! - `Router`: current path and history navigation
//! - `Clock`: wall-clock time for record timestamps
//!
//! Browser implementations live in `web` (WASM only); the simulated ones
//! drive native builds and tests.

pub mod clock;
pub mod router;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clock::{Clock, ManualClock, SystemClock};
pub use router::{MemoryRouter, Router};
pub use viewport::{ScrollBehavior, SimulatedViewport, Viewport, ViewportMetrics};
#[cfg(target_arch = "wasm32")]
pub use web::{WebRouter, WebViewport};
