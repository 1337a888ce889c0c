//! The window callback contract and its default behaviour
//!
//! A window is anything implementing [`Window`]. The context calls these
//! methods on its worker thread only, one at a time, so implementations never
//! see `display()` race with input callbacks or with `destroy()`.
//!
//! Default method bodies give every window an orbit viewer for free: reshape
//! updates the camera viewport, mouse presses are recorded, and drags move
//! the camera. Concrete windows override `display()` to draw and `destroy()`
//! to release whatever GPU resources they created.

use crate::backend::WindowId;
use crate::foundation::math::{constants, Quat, Vec3};
use crate::render::Camera;
use crate::window::input::{ButtonState, Modifiers, MouseButton, MouseEvent};

/// Pan distance for a drag across the full viewport
const PAN_FACTOR: f32 = 10.0;

/// State every window carries: its camera and the last pointer event
#[derive(Debug, Clone, Default)]
pub struct WindowBase {
    /// Camera used to draw this window
    pub camera: Camera,
    /// Latest button transition, with the position updated while dragging
    pub mouse: MouseEvent,
}

impl WindowBase {
    /// Create window state with a default camera
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a pointer drag ending at (`x`, `y`) to the camera
    ///
    /// The delta is the previous pointer position minus the new one,
    /// normalized by the viewport size.
    /// - Left drag: orbit around the target (yaw from horizontal motion,
    ///   pitch from vertical motion)
    /// - Shift + left drag: scale the field of view
    /// - Middle drag: move the camera in its image plane
    /// - Shift + middle drag: move the camera sideways and along the view axis
    ///
    /// Middle drags move only the camera; the target stays where it is, so
    /// a later orbit still pivots around the same point.
    ///
    /// The stored pointer position always moves to (`x`, `y`).
    pub fn drag_to(&mut self, x: i32, y: i32) {
        let mouse = self.mouse;
        let dx = (mouse.x - x) as f32;
        let dy = (mouse.y - y) as f32;
        let width = self.camera.vp_width().max(1) as f32;
        let height = self.camera.vp_height().max(1) as f32;
        let shift = mouse.modifiers.contains(Modifiers::SHIFT);

        if mouse.is_held(MouseButton::Left) {
            if shift {
                let fov_y = self.camera.fov_y() * (1.0 + dy / width);
                self.camera.set_fov_y(fov_y);
            } else {
                let yaw = Quat::from_axis_angle(&Vec3::y_axis(), -dx / width);
                let pitch = Quat::from_axis_angle(&Vec3::x_axis(), -dy / height);
                self.camera.rotate_around_target(&yaw);
                self.camera.rotate_around_target(&pitch);
            }
        } else if mouse.is_held(MouseButton::Middle) {
            let offset = if shift {
                Vec3::new(PAN_FACTOR * dx / width, 0.0, PAN_FACTOR * -dy / height)
            } else {
                Vec3::new(PAN_FACTOR * dx / width, PAN_FACTOR * -dy / height, 0.0)
            };
            let position = self.camera.position() + self.camera.orientation() * offset;
            self.camera.set_position(position);
        }

        self.mouse.x = x;
        self.mouse.y = y;
    }
}

/// Window callbacks dispatched by the context
///
/// Only [`Window::base`] and [`Window::base_mut`] are required.
///
/// # Threading
/// Implementations must be `Send`: they are created on a caller thread and
/// driven from the context's worker thread. Side effects of the input
/// callbacks stay inside the window's own [`WindowBase`].
pub trait Window: Send {
    /// Shared window state
    fn base(&self) -> &WindowBase;

    /// Mutable shared window state
    fn base_mut(&mut self) -> &mut WindowBase;

    /// Called once, right after the toolkit window exists and before any
    /// other callback. The camera already has the window's viewport.
    fn init(&mut self) {}

    /// Draw one frame. Must not block; buffers are swapped afterwards.
    fn display(&mut self) {}

    /// The drawable area changed size
    fn reshape(&mut self, width: u32, height: u32) {
        self.base_mut().camera.set_viewport(width, height);
    }

    /// A mouse button changed state
    fn mouse(&mut self, event: MouseEvent) {
        self.base_mut().mouse = event;
    }

    /// The pointer moved while a button was held
    fn motion(&mut self, x: i32, y: i32) {
        self.base_mut().drag_to(x, y);
    }

    /// Periodic tick; a redraw is requested after every tick
    fn timerfunc(&mut self, _id: WindowId) {}

    /// A character was typed
    fn keyboard(&mut self, _key: char, _x: i32, _y: i32) {}

    /// The window is going away; release toolkit and GPU resources here
    fn destroy(&mut self) {}

    /// The window's camera
    fn camera(&self) -> &Camera {
        &self.base().camera
    }
}

/// A window that uses every default callback
///
/// Draws nothing, but reacts to resizing and mouse drags. Useful as a
/// placeholder and as the starting point for custom windows.
#[derive(Debug, Clone, Default)]
pub struct BasicWindow {
    base: WindowBase,
}

impl BasicWindow {
    /// Create a basic window
    pub fn new() -> Self {
        Self::default()
    }
}

impl Window for BasicWindow {
    fn base(&self) -> &WindowBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WindowBase {
        &mut self.base
    }

    fn init(&mut self) {
        let camera = &mut self.base.camera;
        camera.set_fov_y(constants::QUARTER_PI);
        camera.set_position(Vec3::new(0.0, 0.0, -5.0));
        camera.set_target(Vec3::zeros());
        log::debug!("Basic window initialized ({}x{})", camera.vp_width(), camera.vp_height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn initialized() -> BasicWindow {
        let mut window = BasicWindow::new();
        window.reshape(640, 480);
        window.init();
        window
    }

    fn press(window: &mut BasicWindow, button: MouseButton, modifiers: Modifiers, x: i32, y: i32) {
        window.mouse(MouseEvent::new(x, y, ButtonState::Pressed, button, modifiers));
    }

    #[test]
    fn test_reshape_updates_viewport() {
        let mut window = BasicWindow::new();
        window.reshape(300, 200);
        assert_eq!(window.camera().vp_width(), 300);
        assert_eq!(window.camera().vp_height(), 200);
    }

    #[test]
    fn test_motion_without_button_only_tracks_pointer() {
        let mut window = initialized();
        let frame = window.camera().frame();
        window.mouse(MouseEvent::new(10, 10, ButtonState::Released, MouseButton::Left, Modifiers::empty()));
        window.motion(50, 70);
        assert_eq!(window.camera().frame(), frame);
        assert_eq!((window.base().mouse.x, window.base().mouse.y), (50, 70));
    }

    #[test]
    fn test_left_drag_orbits_at_constant_distance() {
        let mut window = initialized();
        let position = window.camera().position();
        press(&mut window, MouseButton::Left, Modifiers::empty(), 100, 100);
        window.motion(160, 120);

        let camera = window.camera();
        assert!((camera.position() - position).norm() > 1e-3);
        assert_relative_eq!((camera.position() - camera.target()).norm(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_shift_left_drag_scales_fov() {
        let mut window = initialized();
        let fov_y = window.camera().fov_y();
        press(&mut window, MouseButton::Left, Modifiers::SHIFT, 100, 100);
        window.motion(100, 36);
        // dy = 64 over a 640 wide viewport
        assert_relative_eq!(window.camera().fov_y(), fov_y * 1.1, epsilon = 1e-5);
    }

    #[test]
    fn test_middle_drag_pans_without_turning() {
        let mut window = initialized();
        let direction = window.camera().direction();
        let position = window.camera().position();
        let target = window.camera().target();
        press(&mut window, MouseButton::Middle, Modifiers::empty(), 100, 100);
        window.motion(36, 100);

        let camera = window.camera();
        assert_relative_eq!(camera.direction(), direction, epsilon = 1e-5);
        assert_relative_eq!(camera.target(), target, epsilon = 1e-5);
        let moved = camera.position() - position;
        assert_relative_eq!(moved.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(moved.dot(&direction), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shift_middle_drag_moves_along_view_axis() {
        let mut window = initialized();
        let direction = window.camera().direction();
        let position = window.camera().position();
        let target = window.camera().target();
        assert_relative_eq!((target - position).norm(), 5.0, epsilon = 1e-5);
        press(&mut window, MouseButton::Middle, Modifiers::SHIFT, 100, 100);
        // Dragging up moves forward
        window.motion(100, 52);

        let moved = window.camera().position() - position;
        assert_relative_eq!(moved, direction, epsilon = 1e-5);

        // The target stays put, so the camera is now closer to it
        let camera = window.camera();
        assert_relative_eq!(camera.target(), target, epsilon = 1e-5);
        assert_relative_eq!((camera.target() - camera.position()).norm(), 4.0, epsilon = 1e-5);
    }
}
