//! Backend-agnostic windowing toolkit interface
//!
//! The context drives exactly one [`Toolkit`] from its worker thread. A
//! toolkit is assumed to be single-threaded: it is created on the worker,
//! used only there, and dropped there. For that reason the trait does not
//! require `Send`, and the context receives a [`ToolkitFactory`] instead of a
//! toolkit instance.
//!
//! # Available Backends
//! - **`headless`**: In-memory windows, scripted events. Always available.
//! - **`glfw`**: Real OS windows with OpenGL contexts (feature `glfw`).

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::diagnostics::GpuError;
use crate::window::MouseEvent;

#[cfg(feature = "glfw")]
pub mod glfw;
pub mod headless;

#[cfg(feature = "glfw")]
pub use self::glfw::GlfwToolkit;
pub use headless::{HeadlessDisplay, HeadlessToolkit};

/// Toolkit-assigned window identifier
///
/// Ids come from one process-wide counter starting at 1, so an id is never
/// reused even across worker restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(pub i32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window #{}", self.0)
    }
}

static NEXT_WINDOW_ID: AtomicI32 = AtomicI32::new(1);

/// Allocate a fresh window id
pub fn next_window_id() -> WindowId {
    WindowId(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
}

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    /// Title bar text
    pub title: String,
    /// Initial client-area width in pixels
    pub width: u32,
    /// Initial client-area height in pixels
    pub height: u32,
}

impl WindowSpec {
    /// Create window creation parameters
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
        }
    }
}

/// Events a toolkit reports for one of its windows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolkitEvent {
    /// The window needs to be redrawn
    Display,
    /// The drawable area changed size
    Reshape {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// A mouse button was pressed or released
    Mouse(MouseEvent),
    /// The pointer moved while a button was held
    Motion {
        /// Pointer x
        x: i32,
        /// Pointer y
        y: i32,
    },
    /// A character was typed
    Keyboard {
        /// The character
        key: char,
        /// Pointer x at the time
        x: i32,
        /// Pointer y at the time
        y: i32,
    },
    /// Periodic tick. Generated by the context's timer schedule, not by
    /// toolkits.
    Timer,
    /// The user asked to close the window
    CloseRequested,
}

/// Toolkit errors
#[derive(Error, Debug)]
pub enum ToolkitError {
    /// The toolkit could not be initialized on the worker thread
    #[error("Toolkit initialization failed: {0}")]
    InitializationFailed(String),

    /// The toolkit refused to create a window
    #[error("Window creation failed for '{title}': {reason}")]
    CreationFailed {
        /// Title of the window that was requested
        title: String,
        /// Toolkit-provided reason
        reason: String,
    },
}

/// Single-threaded windowing toolkit driven by the context worker
///
/// Mirrors the classic "current window" model: callbacks and drawing apply
/// to whichever window was last made current.
pub trait Toolkit {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Create a window and make it current
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, ToolkitError>;

    /// Destroy a window. Unknown ids are ignored.
    fn destroy_window(&mut self, id: WindowId);

    /// The window drawing and callbacks currently apply to
    fn current_window(&self) -> Option<WindowId>;

    /// Make `id` current. Unknown ids leave the current window unchanged.
    fn set_current_window(&mut self, id: WindowId);

    /// Ask for a [`ToolkitEvent::Display`] on a later poll
    fn post_redisplay(&mut self, id: WindowId);

    /// Present the frame just drawn
    fn swap_buffers(&mut self, id: WindowId);

    /// Run one non-blocking event-loop iteration and return what happened
    fn poll_events(&mut self) -> Vec<(WindowId, ToolkitEvent)>;

    /// Errors the toolkit or graphics API reported since the last call
    fn take_errors(&mut self) -> Vec<GpuError> {
        Vec::new()
    }
}

/// Builds a toolkit on the worker thread
pub type ToolkitFactory = Arc<dyn Fn() -> Result<Box<dyn Toolkit>, ToolkitError> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ids_are_unique_and_positive() {
        let first = next_window_id();
        let second = next_window_id();
        assert!(first.0 > 0);
        assert!(second > first);
    }

    #[test]
    fn test_window_id_display() {
        assert_eq!(WindowId(3).to_string(), "window #3");
    }
}
