//! Window management subsystem
//!
//! # Module Organization
//!
//! - **`handler`**: The [`Window`] callback trait, its default orbit-viewer
//!   behaviour, and [`BasicWindow`]
//! - **`handle`**: [`WindowHandle`], the shared handle callers keep
//! - **`input`**: Mouse and modifier types delivered to callbacks
//!
//! Windows never talk to the toolkit themselves. The context owns the
//! toolkit on its worker thread and forwards toolkit events to the window
//! they were addressed to.

pub mod handle;
pub mod handler;
pub mod input;

pub use handle::WindowHandle;
pub use handler::{BasicWindow, Window, WindowBase};
pub use input::{ButtonState, Modifiers, MouseButton, MouseEvent};
