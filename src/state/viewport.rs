/// Zoom/pan state for an image pane
///
/// Tracks the transform applied when inspecting an image: a zoom scale
/// adjusted by the mouse wheel and a pan offset dragged with the left
/// button. One instance exists per displayed pane (original / edited)
/// so panning one never disturbs the other.

use cgmath::Vector2;
use iced::Point;

/// Multiplier applied per zoom step
const ZOOM_STEP: f32 = 1.25;
/// Smallest allowed zoom scale
const MIN_SCALE: f32 = 0.5;
/// Largest allowed zoom scale
const MAX_SCALE: f32 = 8.0;

/// Interaction mode of the transform
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// No drag in progress
    Idle,
    /// Left button held; `grab` is the pointer position minus the pan
    /// offset at press time
    Panning { grab: Vector2<f32> },
}

/// Zoom scale and pan offset for one image pane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Zoom level (1.0 = fit to pane)
    scale: f32,
    /// Pan offset in screen pixels
    offset: Vector2<f32>,
    mode: Mode,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vector2::new(0.0, 0.0),
            mode: Mode::Idle,
        }
    }
}

impl ViewTransform {
    /// Create an identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Current zoom scale
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current pan offset in screen pixels
    pub fn offset(&self) -> Vector2<f32> {
        self.offset
    }

    /// Whether a drag is in progress (used for the grabbing cursor)
    pub fn is_panning(&self) -> bool {
        matches!(self.mode, Mode::Panning { .. })
    }

    /// Left button pressed: enter panning, recording the pointer's
    /// offset relative to the current pan
    pub fn pointer_pressed(&mut self, position: Point) {
        let pointer = Vector2::new(position.x, position.y);
        self.mode = Mode::Panning {
            grab: pointer - self.offset,
        };
    }

    /// Pointer moved: update the pan linearly while panning, ignore
    /// otherwise
    pub fn pointer_moved(&mut self, position: Point) {
        if let Mode::Panning { grab } = self.mode {
            let pointer = Vector2::new(position.x, position.y);
            self.offset = pointer - grab;
        }
    }

    /// Left button released or pointer left the pane: exit panning
    pub fn pointer_released(&mut self) {
        self.mode = Mode::Idle;
    }

    /// Wheel scrolled: scroll up zooms in, scroll down zooms out
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.zoom_in();
        } else if delta_y < 0.0 {
            self.zoom_out();
        }
    }

    /// Multiply the scale by one zoom step, clamped to the valid range
    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * ZOOM_STEP).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Divide the scale by one zoom step, clamped to the valid range
    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / ZOOM_STEP).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Restore the identity transform
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check if this transform changes nothing (for skipping the reset
    /// button highlight)
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == Vector2::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_saturates_at_max() {
        let mut view = ViewTransform::new();
        // 1.25^17 > 8, so seventeen steps must saturate at the cap
        for _ in 0..17 {
            view.zoom_in();
        }
        assert_eq!(view.scale(), MAX_SCALE);

        // Further steps stay clamped
        view.zoom_in();
        assert_eq!(view.scale(), MAX_SCALE);
    }

    #[test]
    fn test_zoom_saturates_at_min() {
        let mut view = ViewTransform::new();
        for _ in 0..20 {
            view.zoom_out();
        }
        assert_eq!(view.scale(), MIN_SCALE);
    }

    #[test]
    fn test_zoom_step_is_multiplicative() {
        let mut view = ViewTransform::new();
        view.zoom_in();
        assert_eq!(view.scale(), 1.25);
        view.zoom_in();
        assert_eq!(view.scale(), 1.5625);
        view.zoom_out();
        assert_eq!(view.scale(), 1.25);
    }

    #[test]
    fn test_wheel_direction() {
        let mut view = ViewTransform::new();
        view.wheel(1.0);
        assert!(view.scale() > 1.0);
        view.wheel(-1.0);
        assert_eq!(view.scale(), 1.0);
        // A zero delta changes nothing
        view.wheel(0.0);
        assert_eq!(view.scale(), 1.0);
    }

    #[test]
    fn test_pan_state_machine() {
        let mut view = ViewTransform::new();
        assert!(!view.is_panning());

        // Moves while idle are ignored
        view.pointer_moved(Point::new(50.0, 50.0));
        assert_eq!(view.offset(), Vector2::new(0.0, 0.0));

        // Press at (10, 10), drag to (25, 40): pan moves by the delta
        view.pointer_pressed(Point::new(10.0, 10.0));
        assert!(view.is_panning());
        view.pointer_moved(Point::new(25.0, 40.0));
        assert_eq!(view.offset(), Vector2::new(15.0, 30.0));

        // Release exits panning; later moves change nothing
        view.pointer_released();
        assert!(!view.is_panning());
        view.pointer_moved(Point::new(100.0, 100.0));
        assert_eq!(view.offset(), Vector2::new(15.0, 30.0));
    }

    #[test]
    fn test_pan_is_relative_to_existing_offset() {
        let mut view = ViewTransform::new();
        view.pointer_pressed(Point::new(0.0, 0.0));
        view.pointer_moved(Point::new(10.0, 0.0));
        view.pointer_released();

        // A second drag continues from the accumulated offset
        view.pointer_pressed(Point::new(5.0, 5.0));
        view.pointer_moved(Point::new(10.0, 5.0));
        assert_eq!(view.offset(), Vector2::new(15.0, 0.0));
    }

    #[test]
    fn test_reset_restores_identity() {
        let mut view = ViewTransform::new();
        view.zoom_in();
        view.pointer_pressed(Point::new(0.0, 0.0));
        view.pointer_moved(Point::new(30.0, 30.0));
        assert!(!view.is_identity());

        view.reset();
        assert!(view.is_identity());
        assert!(!view.is_panning());
    }
}
