//! Incremental-load trigger
//!
//! Decides when the bottom-of-list sentinel has been reached. Detection is
//! edge-triggered: one signal per crossing, re-armed when the sentinel leaves
//! the viewport or when new content pushes it further down.

use serde::{Deserialize, Serialize};

/// Trigger only once the sentinel is entirely in view
pub const FULL_VISIBILITY: f64 = 1.0;

const EPSILON: f64 = 1e-9;

/// A vertical extent, in whatever unit the presentation layer uses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

/// Fraction of `sentinel` that lies inside `viewport`
///
/// A zero-height sentinel counts as fully visible when its position is inside
/// the viewport.
pub fn visibility_ratio(viewport: Span, sentinel: Span) -> f64 {
    if sentinel.is_empty() {
        let inside = sentinel.start >= viewport.start && sentinel.start <= viewport.end;
        return if inside { 1.0 } else { 0.0 };
    }

    let overlap = viewport.end.min(sentinel.end) - viewport.start.max(sentinel.start);
    (overlap.max(0.0) / sentinel.len()).min(1.0)
}

/// Scroll-position detection: the viewport's bottom edge reached the content end
pub fn scrolled_to_bottom(viewport_height: f64, scroll_top: f64, content_height: f64) -> bool {
    viewport_height + scroll_top + EPSILON >= content_height
}

/// Edge-triggered boundary detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryTrigger {
    armed: bool,
    threshold: f64,
}

impl Default for BoundaryTrigger {
    fn default() -> Self {
        Self::new(FULL_VISIBILITY)
    }
}

impl BoundaryTrigger {
    /// `threshold` is clamped into `(0, 1]`
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(1.0)
        } else {
            FULL_VISIBILITY
        };
        Self {
            armed: true,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether `ratio` is at or past the threshold, without touching the arming
    pub fn reaches(&self, ratio: f64) -> bool {
        ratio + EPSILON >= self.threshold
    }

    /// Feed the latest visibility ratio; returns `true` exactly once per crossing
    pub fn observe(&mut self, ratio: f64) -> bool {
        if self.reaches(ratio) {
            let fired = self.armed;
            self.armed = false;
            fired
        } else {
            self.armed = true;
            false
        }
    }

    /// Convenience for scroll-position based presentation layers
    pub fn observe_scroll(
        &mut self,
        viewport_height: f64,
        scroll_top: f64,
        content_height: f64,
    ) -> bool {
        let ratio = if scrolled_to_bottom(viewport_height, scroll_top, content_height) {
            1.0
        } else {
            0.0
        };
        self.observe(ratio)
    }

    /// The content above the sentinel changed, so it moved
    pub fn rearm(&mut self) {
        self.armed = true;
    }
}
