//! # Multiview
//!
//! Orbit-camera windows multiplexed onto a single-threaded windowing toolkit.
//!
//! ## Features
//!
//! - **Background Event Loop**: One worker thread owns the toolkit; any thread may show or destroy windows
//! - **Orbit Camera**: Rotate around a target, pan, zoom, project and un-project
//! - **Default Interaction**: Mouse drags orbit, pan and change the field of view out of the box
//! - **Per-Window Timers**: Periodic ticks followed by a redraw
//! - **Headless Backend**: Scriptable in-memory windows for tests and display-less machines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multiview::prelude::*;
//!
//! struct Points {
//!     base: WindowBase,
//! }
//!
//! impl Window for Points {
//!     fn base(&self) -> &WindowBase {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut WindowBase {
//!         &mut self.base
//!     }
//!
//!     fn display(&mut self) {
//!         // Draw with self.base.camera
//!     }
//! }
//!
//! fn main() -> Result<(), ContextError> {
//!     let (context, _display) = Context::headless(ContextConfig::default());
//!     let points = WindowHandle::new("points", Points { base: WindowBase::new() });
//!     context.show(&points);
//!     context.wait()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod render;
pub mod window;
pub mod backend;
pub mod context;
pub mod diagnostics;

pub use backend::WindowId;
pub use config::{Config, ConfigError, ContextConfig};
pub use context::{Context, ContextError};
pub use render::Camera;
pub use window::{BasicWindow, Window, WindowBase, WindowHandle};

/// Show a window on the process-wide GLFW context, starting it if needed
#[cfg(feature = "glfw")]
pub fn show(handle: &WindowHandle) {
    Context::global().show(handle);
}

/// Destroy a window on the process-wide GLFW context
#[cfg(feature = "glfw")]
pub fn destroy(handle: &WindowHandle) {
    Context::global().destroy(handle);
}

/// Block until the process-wide GLFW context's worker exits
#[cfg(feature = "glfw")]
pub fn wait() -> Result<(), ContextError> {
    Context::global().wait()
}

/// Stop the process-wide GLFW context and wait for it
#[cfg(feature = "glfw")]
pub fn stop() -> Result<(), ContextError> {
    Context::global().stop()
}

/// Common imports for multiview users
pub mod prelude {
    pub use crate::{
        backend::{HeadlessDisplay, Toolkit, ToolkitEvent, WindowId},
        foundation::math::{Mat4, Quat, Vec2, Vec3},
        render::{Camera, Frame},
        window::{ButtonState, Modifiers, MouseButton, MouseEvent},
        BasicWindow, Context, ContextConfig, ContextError, Window, WindowBase, WindowHandle,
    };
}
