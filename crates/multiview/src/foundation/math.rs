//! Math utilities and types
//!
//! Thin aliases over nalgebra so the rest of the crate speaks in `f32`
//! graphics types without repeating generic parameters.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Isometry3, Translation3,
    Rotation3, UnitQuaternion,
};

/// 2D vector type (screen coordinates)
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (homogeneous coordinates)
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion used for every rotation in the crate
pub type Quat = UnitQuaternion<f32>;

/// Rigid transform (rotation followed by translation)
///
/// The camera's view transform is always rigid, so it is stored in this form
/// rather than as a general 4x4 matrix.
pub type Isometry = Isometry3<f32>;

/// Pure translation
pub type Translation = Translation3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 3, the default camera field of view
    pub const THIRD_PI: f32 = PI / 3.0;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;
}
