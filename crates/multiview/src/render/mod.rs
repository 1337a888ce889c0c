//! Rendering-side primitives shared by every window
//!
//! Only the camera model lives here. Drawing itself belongs to the concrete
//! [`crate::window::Window`] implementations.

pub mod camera;

pub use camera::{Camera, Frame};
