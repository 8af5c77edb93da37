//! Pan/zoom state for the displayed image.
//!
//! Every gesture funnels into one [`ViewportState`]; the surface receives it as
//! a single translate-then-scale [`Transform`]. Discrete zoom steps are not
//! clamped, wheel and pinch are.

use std::fmt;

use crate::config::ViewportOptions;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct GestureState {
    dragging: bool,
    drag_start: Point,
    translate_at_drag_start: Point,
    last_pinch_distance: Option<f64>,
}

/// Translate (in unscaled pixels) followed by scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}px, {}px) scale({})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}

pub struct Viewport {
    state: ViewportState,
    gesture: GestureState,
    options: ViewportOptions,
}

impl Viewport {
    pub fn new(options: ViewportOptions) -> Self {
        Self {
            state: ViewportState {
                scale: options.initial_scale,
                translate_x: 0.0,
                translate_y: 0.0,
            },
            gesture: GestureState::default(),
            options,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.dragging
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translate_x: self.state.translate_x,
            translate_y: self.state.translate_y,
            scale: self.state.scale,
        }
    }

    pub fn zoom_label(&self) -> String {
        format!("{:.0}%", self.state.scale * 100.0)
    }

    pub fn zoom_in(&mut self) {
        self.state.scale *= self.options.zoom_step;
    }

    pub fn zoom_out(&mut self) {
        self.state.scale /= self.options.zoom_step;
    }

    pub fn reset_zoom(&mut self) {
        self.state.scale = self.options.initial_scale;
        self.reset_translation();
    }

    /// Called when a new image finishes loading; scale is kept.
    pub fn reset_translation(&mut self) {
        self.state.translate_x = 0.0;
        self.state.translate_y = 0.0;
    }

    pub fn on_wheel(&mut self, delta_y: f64) {
        let scale = if delta_y < 0.0 {
            self.state.scale * self.options.zoom_step
        } else {
            self.state.scale / self.options.zoom_step
        };
        self.state.scale = self.clamp_scale(scale);
    }

    pub fn begin_drag(&mut self, at: Point) {
        self.gesture.last_pinch_distance = None;
        self.gesture.dragging = true;
        self.gesture.drag_start = at;
        self.gesture.translate_at_drag_start =
            Point::new(self.state.translate_x, self.state.translate_y);
    }

    /// Returns `false` when no drag is in progress.
    pub fn update_drag(&mut self, at: Point) -> bool {
        if !self.gesture.dragging {
            return false;
        }
        let origin = self.gesture.translate_at_drag_start;
        self.state.translate_x = origin.x + (at.x - self.gesture.drag_start.x);
        self.state.translate_y = origin.y + (at.y - self.gesture.drag_start.y);
        true
    }

    pub fn end_drag(&mut self) {
        self.gesture.dragging = false;
    }

    pub fn begin_pinch(&mut self, a: Point, b: Point) {
        self.gesture.dragging = false;
        self.gesture.last_pinch_distance = Some(a.distance(b));
    }

    /// Scales by the ratio to the previous sample, not to the gesture start.
    /// Returns `false` without a usable baseline.
    pub fn update_pinch(&mut self, a: Point, b: Point) -> bool {
        let Some(last) = self.gesture.last_pinch_distance else {
            return false;
        };
        let current = a.distance(b);
        // a zero or overflowed distance cannot anchor a ratio
        if !(last.is_finite() && last > 0.0 && current.is_finite()) {
            self.gesture.last_pinch_distance = Some(current);
            return false;
        }
        self.state.scale = self.clamp_scale(self.state.scale * (current / last));
        self.gesture.last_pinch_distance = Some(current);
        true
    }

    pub fn end_pinch(&mut self) {
        self.gesture.last_pinch_distance = None;
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.options.min_scale, self.options.max_scale)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportOptions::default())
    }
}
