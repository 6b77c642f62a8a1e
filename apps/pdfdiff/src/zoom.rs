//! Zoom level shared by both panes

use serde::{Deserialize, Serialize};

pub const MIN_PERCENT: u32 = 10;
pub const MAX_PERCENT: u32 = 500;
pub const DEFAULT_PERCENT: u32 = 100;
pub const STEP_PERCENT: u32 = 10;

/// Horizontal padding kept free when fitting a page to the viewport
const FIT_MARGIN: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zoom {
    percent: u32,
    /// Set by `fit_width`, cleared by any manual change
    fit: bool,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            percent: DEFAULT_PERCENT,
            fit: false,
        }
    }
}

impl Zoom {
    pub fn new(percent: u32) -> Self {
        Self {
            percent: percent.clamp(MIN_PERCENT, MAX_PERCENT),
            fit: false,
        }
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    pub fn is_fit(&self) -> bool {
        self.fit
    }

    /// Render scale
    pub fn scale(&self) -> f32 {
        self.percent as f32 / 100.0
    }

    pub fn set_percent(&mut self, percent: u32) {
        *self = Self::new(percent);
    }

    pub fn step_in(&mut self) {
        self.set_percent(self.percent.saturating_add(STEP_PERCENT));
    }

    pub fn step_out(&mut self) {
        self.set_percent(self.percent.saturating_sub(STEP_PERCENT));
    }

    /// Mouse wheel: positive delta zooms in, anything else zooms out
    pub fn wheel(&mut self, delta: i32) {
        if delta > 0 {
            self.step_in();
        } else {
            self.step_out();
        }
    }

    /// Fit a page of `page_width` points into `viewport_width` pixels.
    ///
    /// Returns the scale to render at, or `None` when the page width is
    /// unknown or not positive.
    pub fn fit_width(&mut self, viewport_width: f32, page_width: f32) -> Option<f32> {
        if page_width.is_nan() || page_width <= 0.0 {
            return None;
        }
        let min = MIN_PERCENT as f32 / 100.0;
        let max = MAX_PERCENT as f32 / 100.0;
        let scale = ((viewport_width - FIT_MARGIN) / page_width).clamp(min, max);

        self.percent = ((scale * 100.0) as u32).clamp(MIN_PERCENT, MAX_PERCENT);
        self.fit = true;
        tracing::trace!(viewport_width, page_width, percent = self.percent, "Fit to width");
        Some(scale)
    }

    /// Label such as `"150%"`
    pub fn label(&self) -> String {
        format!("{}%", self.percent)
    }
}
