//! Deciding whether the definition view must scroll to the active occurrence

use serde::{Deserialize, Serialize};

pub const TOP_BUFFER: f64 = 50.0;
pub const BOTTOM_BUFFER: f64 = 150.0;
pub const SCROLL_LEAD: f64 = 100.0;

/// Margins, in pixels, used when deciding whether an occurrence is
/// comfortably visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Occurrences closer than this to the top edge trigger a scroll
    pub top_buffer: f64,
    /// Occurrences closer than this to the bottom edge trigger a scroll
    pub bottom_buffer: f64,
    /// How far above the occurrence the new scroll offset lands
    pub scroll_lead: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            top_buffer: TOP_BUFFER,
            bottom_buffer: BOTTOM_BUFFER,
            scroll_lead: SCROLL_LEAD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollDecision {
    pub should_scroll: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_y: Option<f64>,
}

impl ScrollDecision {
    pub fn stay() -> Self {
        Self {
            should_scroll: false,
            target_y: None,
        }
    }

    pub fn scroll_to(target_y: f64) -> Self {
        Self {
            should_scroll: true,
            target_y: Some(target_y),
        }
    }
}

impl ScrollConfig {
    /// `y` is the measured position of the active occurrence in content
    /// coordinates, `scroll_y` the current offset and `viewport_h` the
    /// visible height.
    pub fn resolve(&self, y: f64, scroll_y: f64, viewport_h: f64) -> ScrollDecision {
        let viewport_top = scroll_y + self.top_buffer;
        let viewport_bottom = scroll_y + viewport_h - self.bottom_buffer;

        if y < viewport_top || y > viewport_bottom {
            ScrollDecision::scroll_to((y - self.scroll_lead).max(0.0))
        } else {
            ScrollDecision::stay()
        }
    }
}

/// [`ScrollConfig::resolve`] with the default margins.
pub fn resolve_scroll_target(y: f64, scroll_y: f64, viewport_h: f64) -> ScrollDecision {
    ScrollConfig::default().resolve(y, scroll_y, viewport_h)
}
