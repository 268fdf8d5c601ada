use iced::widget::canvas::{self, Program};
use iced::mouse::{self, Cursor};
use iced::widget::image::Handle;
use iced::{Point, Rectangle, Renderer, Size, Theme};

use crate::state::viewport::ViewTransform;
use crate::Message;

/// Which image pane an interaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Original,
    Edited,
}

/// Pointer interactions a pane forwards to the controller, which owns
/// that pane's ViewTransform
#[derive(Debug, Clone)]
pub enum PaneEvent {
    Pressed(Point),
    Moved(Point),
    Released,
    Wheel(f32),
}

/// Canvas renderer for one image pane with zoom/pan support
///
/// The pane fits the image inside its bounds, then applies the pane's
/// ViewTransform on top. All interaction state lives in the controller
/// so the original and edited panes never interfere.
pub struct ImagePane<'a> {
    /// Which pane this is (selects the transform the events route to)
    pub pane: Pane,
    /// Decoded image handle to draw
    pub handle: &'a Handle,
    /// Natural pixel dimensions of the displayed image
    pub image_size: (u32, u32),
    /// The pane's zoom/pan transform
    pub view: &'a ViewTransform,
}

impl<'a> ImagePane<'a> {
    /// Destination rectangle for the image inside the pane bounds
    fn placement(&self, bounds: Rectangle) -> Option<Rectangle> {
        let (w, h) = self.image_size;
        if w == 0 || h == 0 {
            return None;
        }

        // Fit to the pane, preserving aspect ratio, then zoom
        let fit = (bounds.width / w as f32).min(bounds.height / h as f32);
        let scale = fit * self.view.scale();
        let size = Size::new(w as f32 * scale, h as f32 * scale);

        let offset = self.view.offset();
        let top_left = Point::new(
            (bounds.width - size.width) / 2.0 + offset.x,
            (bounds.height - size.height) / 2.0 + offset.y,
        );

        Some(Rectangle::new(top_left, size))
    }
}

impl<'a> Program<Message> for ImagePane<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        if let Some(placement) = self.placement(bounds) {
            frame.draw_image(placement, canvas::Image::new(self.handle.clone()));
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        _bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y,
                    mouse::ScrollDelta::Pixels { y, .. } => y,
                };
                return (
                    canvas::event::Status::Captured,
                    Some(Message::Pane(self.pane, PaneEvent::Wheel(y))),
                );
            }

            // Left button press - start panning at the pointer position
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position() {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Pane(self.pane, PaneEvent::Pressed(position))),
                    );
                }
            }

            // Left button release - stop panning
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                return (
                    canvas::event::Status::Captured,
                    Some(Message::Pane(self.pane, PaneEvent::Released)),
                );
            }

            // Pointer leaving the pane also ends the drag
            canvas::Event::Mouse(mouse::Event::CursorLeft) => {
                if self.view.is_panning() {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Pane(self.pane, PaneEvent::Released)),
                    );
                }
            }

            // Pointer move - pan while the transform is in drag mode
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if self.view.is_panning() {
                    if let Some(position) = cursor.position() {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::Pane(self.pane, PaneEvent::Moved(position))),
                        );
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if self.view.is_panning() {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}
