//! Viewport metrics and scroll commands

use crate::error::ViewportError;

/// How a scroll command moves the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Jump without animation
    #[default]
    Instant,
    /// Animated scroll
    Smooth,
}

/// Live measurements of the scrolling viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportMetrics {
    pub scroll_offset: u32,
    pub viewport_height: u32,
    pub document_height: u32,
}

impl ViewportMetrics {
    /// Largest offset the page can currently scroll to
    #[inline]
    pub fn max_extent(&self) -> u32 {
        self.document_height.saturating_sub(self.viewport_height)
    }
}

/// The scrollable page
pub trait Viewport {
    fn metrics(&self) -> Result<ViewportMetrics, ViewportError>;
    fn scroll_to(&mut self, offset: u32, behavior: ScrollBehavior) -> Result<(), ViewportError>;
}

/// Viewport model that behaves like a browser window: offsets clamp to the
/// scrollable extent and shrinking content pulls the offset up with it.
#[derive(Debug, Clone)]
pub struct SimulatedViewport {
    scroll_offset: u32,
    viewport_height: u32,
    document_height: u32,
    /// Number of upcoming `metrics()` calls that fail
    failing_queries: std::cell::Cell<u32>,
    /// Number of upcoming `scroll_to()` calls that fail
    failing_scrolls: u32,
    scroll_commands: Vec<(u32, ScrollBehavior)>,
}

impl SimulatedViewport {
    pub fn new(viewport_height: u32, document_height: u32) -> Self {
        Self {
            scroll_offset: 0,
            viewport_height,
            document_height,
            failing_queries: std::cell::Cell::new(0),
            failing_scrolls: 0,
            scroll_commands: Vec::new(),
        }
    }

    pub fn offset(&self) -> u32 {
        self.scroll_offset
    }

    fn clamp(&mut self) {
        let max = self.document_height.saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max);
    }

    /// Content grew or shrank (images loaded, sections mounted, ...)
    pub fn set_document_height(&mut self, height: u32) {
        self.document_height = height;
        self.clamp();
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height;
        self.clamp();
    }

    /// Scroll as the user would, without going through the command log
    pub fn user_scroll(&mut self, offset: u32) {
        self.scroll_offset = offset;
        self.clamp();
    }

    /// Make the next `n` metric queries fail
    pub fn fail_next_queries(&self, n: u32) {
        self.failing_queries.set(n);
    }

    /// Make the next `n` scroll commands fail
    pub fn fail_next_scrolls(&mut self, n: u32) {
        self.failing_scrolls = n;
    }

    /// Every successful scroll command issued so far
    pub fn scroll_commands(&self) -> &[(u32, ScrollBehavior)] {
        &self.scroll_commands
    }
}

impl Viewport for SimulatedViewport {
    fn metrics(&self) -> Result<ViewportMetrics, ViewportError> {
        let failing = self.failing_queries.get();
        if failing > 0 {
            self.failing_queries.set(failing - 1);
            return Err(ViewportError::Unavailable);
        }
        Ok(ViewportMetrics {
            scroll_offset: self.scroll_offset,
            viewport_height: self.viewport_height,
            document_height: self.document_height,
        })
    }

    fn scroll_to(&mut self, offset: u32, behavior: ScrollBehavior) -> Result<(), ViewportError> {
        if self.failing_scrolls > 0 {
            self.failing_scrolls -= 1;
            return Err(ViewportError::Command("simulated failure".to_string()));
        }
        self.scroll_commands.push((offset, behavior));
        self.scroll_offset = offset;
        self.clamp();
        Ok(())
    }
}
