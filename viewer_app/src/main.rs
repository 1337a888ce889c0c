//! Orbit viewer demo
//!
//! Opens two windows on the process-wide GLFW context and waits for the user
//! to close them. A second round shows a window, destroys it straight away,
//! then shows the same window again.
//!
//! Drag with the left button to orbit, shift + left to change the field of
//! view, the middle button to pan. Press `r` to reset the view.

use multiview::foundation::logging;
use multiview::foundation::math::{constants, Vec3};
use multiview::prelude::*;

/// Corners of the box centred on the camera target
const BOX_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

struct BoxWindow {
    base: WindowBase,
    frames: u64,
}

impl BoxWindow {
    fn new() -> Self {
        Self {
            base: WindowBase::new(),
            frames: 0,
        }
    }

    fn reset_view(&mut self) {
        let camera = &mut self.base.camera;
        camera.set_fov_y(constants::QUARTER_PI);
        camera.set_position(Vec3::new(0.0, 0.0, -5.0));
        camera.set_target(Vec3::zeros());
    }

    /// Number of box corners that land inside the viewport
    fn visible_corners(&self) -> usize {
        let camera = &self.base.camera;
        let (width, height) = (camera.vp_width() as f32, camera.vp_height() as f32);
        BOX_CORNERS
            .iter()
            .filter_map(|&[x, y, z]| camera.project(&Vec3::new(x, y, z)))
            .filter(|(screen, depth)| {
                *depth > 0.0 && (0.0..=width).contains(&screen.x) && (0.0..=height).contains(&screen.y)
            })
            .count()
    }
}

impl Window for BoxWindow {
    fn base(&self) -> &WindowBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WindowBase {
        &mut self.base
    }

    fn init(&mut self) {
        self.reset_view();
    }

    fn display(&mut self) {
        self.frames += 1;
        log::trace!(
            "frame {}: {} of 8 corners visible from {:?}",
            self.frames,
            self.visible_corners(),
            self.base.camera.position()
        );
    }

    fn keyboard(&mut self, key: char, _x: i32, _y: i32) {
        if key == 'r' {
            self.reset_view();
        }
    }

    fn destroy(&mut self) {
        log::info!("Box window drew {} frames", self.frames);
    }
}

fn main() -> Result<(), ContextError> {
    logging::init_with_level(&ContextConfig::default().log_level);

    {
        let first = WindowHandle::new("a box", BoxWindow::new());
        let second = WindowHandle::new("another box", BoxWindow::new());
        multiview::show(&first);
        multiview::show(&second);
        multiview::wait()?;
    }

    log::info!("second round");
    {
        let window = WindowHandle::new("a destitute box", BoxWindow::new());
        multiview::show(&window);
        multiview::destroy(&window);
        log::info!("destroy..");
        multiview::wait()?;
        multiview::show(&window);
        multiview::wait()?;
    }

    log::info!("exiting");
    Ok(())
}
