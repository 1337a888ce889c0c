//! # Orbit Camera
//!
//! Virtual camera for interactive 3D viewers: orbit around a target point,
//! pan in the image plane, zoom along the view axis, and map screen points
//! back into the world.
//!
//! ## Design Principles
//! - **Frame based**: Pose is a position plus a unit quaternion. The view
//!   transform is derived from it, never stored as the source of truth,
//!   except transiently inside [`Camera::rotate_around_target`].
//! - **Compute on read**: View and projection matrices are cached and only
//!   rebuilt when a setter marked them stale. Pose setters touch the view
//!   cache only; viewport, field of view and clip planes touch the
//!   projection cache only.
//! - **OpenGL conventions**: Right-handed view space looking down -Z, clip
//!   space w taken from -z, depth mapped to [-1, 1].

use std::cell::Cell;

use crate::foundation::math::{
    constants, Isometry, Mat3, Mat4, Point3, Quat, Rotation3, Translation, Vec2, Vec3, Vec4,
};

/// Camera pose: position and orientation in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Camera position in world space
    pub position: Vec3,
    /// Rotation from camera space to world space
    pub orientation: Quat,
}

impl Frame {
    /// Create a frame from a position and orientation
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
        }
    }
}

/// Perspective camera with a pivot target and lazily cached matrices
///
/// # Coordinate System
/// Camera space is right-handed and Y-up:
/// - X+ = Right
/// - Y+ = Up
/// - Z- = Forward (the viewing direction)
///
/// # Caching
/// `view_transform()`, `view_matrix()` and `projection_matrix()` take `&self`
/// and memoize their result in [`Cell`]s. Every setter clears exactly the
/// cache it affects, so a read after any mutation is never stale and each
/// matrix is rebuilt at most once per invalidation.
#[derive(Debug, Clone)]
pub struct Camera {
    vp_x: u32,
    vp_y: u32,
    vp_width: u32,
    vp_height: u32,

    fov_y: f32,
    near: f32,
    far: f32,

    frame: Frame,
    target: Vec3,

    view: Cell<Isometry>,
    view_dirty: Cell<bool>,
    projection: Cell<Mat4>,
    projection_dirty: Cell<bool>,
}

impl Camera {
    /// Create a camera with the default viewer configuration
    ///
    /// # Default Configuration
    /// - Position: (100, 100, 100), looking at the origin
    /// - FOV: 60 degrees
    /// - Near: 0.1, Far: 100.0
    /// - Viewport: empty until the first reshape
    pub fn new() -> Self {
        let mut camera = Self {
            vp_x: 0,
            vp_y: 0,
            vp_width: 0,
            vp_height: 0,
            fov_y: constants::THIRD_PI,
            near: 0.1,
            far: 100.0,
            frame: Frame::default(),
            target: Vec3::zeros(),
            view: Cell::new(Isometry::identity()),
            view_dirty: Cell::new(true),
            projection: Cell::new(Mat4::identity()),
            projection_dirty: Cell::new(true),
        };
        camera.set_position(Vec3::repeat(100.0));
        camera.set_target(Vec3::zeros());
        camera
    }

    /// Set the viewport size, keeping its origin
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.vp_width = width;
        self.vp_height = height;
        self.projection_dirty.set(true);
    }

    /// Set the viewport origin and size
    pub fn set_viewport_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.vp_x = x;
        self.vp_y = y;
        self.set_viewport(width, height);
    }

    /// Viewport origin, x
    pub fn vp_x(&self) -> u32 {
        self.vp_x
    }

    /// Viewport origin, y
    pub fn vp_y(&self) -> u32 {
        self.vp_y
    }

    /// Viewport width in pixels
    pub fn vp_width(&self) -> u32 {
        self.vp_width
    }

    /// Viewport height in pixels
    pub fn vp_height(&self) -> u32 {
        self.vp_height
    }

    /// Width over height; 1.0 while the viewport has no height
    pub fn aspect_ratio(&self) -> f32 {
        if self.vp_height == 0 {
            1.0
        } else {
            self.vp_width as f32 / self.vp_height as f32
        }
    }

    /// Set the vertical field of view in radians
    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.fov_y = fov_y;
        self.projection_dirty.set(true);
    }

    /// Vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Set the near and far clip distances
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty.set(true);
    }

    /// Near clip distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Move the camera without changing its orientation or target
    pub fn set_position(&mut self, position: Vec3) {
        self.frame.position = position;
        self.view_dirty.set(true);
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.frame.position
    }

    /// Replace the camera orientation
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.frame.orientation = orientation;
        self.view_dirty.set(true);
    }

    /// Rotation from camera space to world space
    pub fn orientation(&self) -> Quat {
        self.frame.orientation
    }

    /// Replace position and orientation at once
    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
        self.view_dirty.set(true);
    }

    /// Current pose
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Pivot point used by orbiting and zooming
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Forward axis in world space (camera -Z)
    pub fn direction(&self) -> Vec3 {
        -(self.frame.orientation * Vec3::z())
    }

    /// Up axis in world space (camera +Y)
    pub fn up(&self) -> Vec3 {
        self.frame.orientation * Vec3::y()
    }

    /// Right axis in world space (camera +X)
    pub fn right(&self) -> Vec3 {
        self.frame.orientation * Vec3::x()
    }

    /// Turn the camera to look along `direction`, keeping the current up vector
    ///
    /// Builds an orthonormal basis with z = -direction, x = up × z and
    /// y = z × x. When the current up vector is parallel to the new
    /// direction the current right axis stands in for it. A zero direction
    /// leaves the orientation untouched.
    pub fn set_direction(&mut self, direction: Vec3) {
        if direction.norm_squared() <= f32::EPSILON {
            log::trace!("Ignoring zero camera direction");
            return;
        }

        let z = (-direction).normalize();
        let mut x = self.up().cross(&z);
        if x.norm_squared() <= f32::EPSILON {
            let right = self.right();
            x = right - z * right.dot(&z);
        }
        let x = x.normalize();
        let y = z.cross(&x);

        let basis = Rotation3::from_matrix_unchecked(Mat3::from_columns(&[x, y, z]));
        self.set_orientation(Quat::from_rotation_matrix(&basis));
    }

    /// Set the pivot point and aim the camera at it
    ///
    /// When the target coincides with the camera position no viewing
    /// direction is defined; the target is stored and the orientation is
    /// left as it was.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        if approx::relative_ne!(self.target, self.frame.position) {
            self.set_direction(self.target - self.frame.position);
        }
    }

    /// Orbit the camera around its target
    ///
    /// The rotation is applied to the view transform itself: move the
    /// target (in camera space) to the origin, rotate by `rotation`, move it
    /// back, then compose with the current view. Position and orientation
    /// are re-extracted from the result. Going through the view transform
    /// keeps the distance to the target exact across long drags made of many
    /// small rotations.
    ///
    /// # Arguments
    /// * `rotation` - Rotation expressed in camera space
    pub fn rotate_around_target(&mut self, rotation: &Quat) {
        let view = self.view_transform();
        let pivot = view.transform_point(&Point3::from(self.target));

        let view = Isometry::rotation_wrt_point(*rotation, pivot) * view;

        let orientation = view.rotation.inverse();
        let position = -(orientation * view.translation.vector);
        self.frame = Frame::new(position, orientation);

        // The new view is already known; no need to rebuild it from the frame.
        self.view.set(view);
        self.view_dirty.set(false);
    }

    /// Rotate the camera in place, carrying the target along
    ///
    /// The target stays at the same distance, in front of the camera along
    /// the new viewing direction.
    pub fn local_rotate(&mut self, rotation: &Quat) {
        let distance = (self.frame.position - self.target).norm();
        self.set_orientation(self.frame.orientation * rotation);
        self.target = self.frame.position + self.direction() * distance;
    }

    /// Move toward the target by `delta` along the viewing direction
    ///
    /// Does nothing when the move would reach or cross the target. Negative
    /// values move away from it.
    pub fn zoom(&mut self, delta: f32) {
        let distance = (self.frame.position - self.target).norm();
        if distance > delta {
            self.set_position(self.frame.position + self.direction() * delta);
        }
    }

    /// Pan: translate camera and target by `offset` given in camera space
    pub fn local_translate(&mut self, offset: &Vec3) {
        let translation = self.frame.orientation * offset;
        self.set_position(self.frame.position + translation);
        self.set_target(self.target + translation);
    }

    /// World-to-camera rigid transform
    pub fn view_transform(&self) -> Isometry {
        if self.view_dirty.get() {
            let rotation = self.frame.orientation.inverse();
            let translation = -(rotation * self.frame.position);
            self.view.set(Isometry::from_parts(Translation::from(translation), rotation));
            self.view_dirty.set(false);
        }
        self.view.get()
    }

    /// World-to-camera transform as a homogeneous matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view_transform().to_homogeneous()
    }

    /// Symmetric perspective projection
    ///
    /// ```text
    /// [ cot(fov/2)/aspect  0           0             0            ]
    /// [ 0                  cot(fov/2)  0             0            ]
    /// [ 0                  0           -(f+n)/(f-n)  -2fn/(f-n)   ]
    /// [ 0                  0           -1            0            ]
    /// ```
    pub fn projection_matrix(&self) -> Mat4 {
        if self.projection_dirty.get() {
            let inv_tan = 1.0 / (self.fov_y * 0.5).tan();
            let range = self.far - self.near;

            let mut projection = Mat4::zeros();
            projection[(0, 0)] = inv_tan / self.aspect_ratio();
            projection[(1, 1)] = inv_tan;
            projection[(2, 2)] = -(self.near + self.far) / range;
            projection[(2, 3)] = -2.0 * self.near * self.far / range;
            projection[(3, 2)] = -1.0;

            self.projection.set(projection);
            self.projection_dirty.set(false);
        }
        self.projection.get()
    }

    /// Project a world point to viewport coordinates
    ///
    /// # Returns
    /// The screen point and its camera-space depth (distance along the
    /// viewing direction), or `None` for points on the camera plane.
    pub fn project(&self, world: &Vec3) -> Option<(Vec2, f32)> {
        let eye = self.view_transform().transform_point(&Point3::from(*world));
        let clip = self.projection_matrix() * Vec4::new(eye.x, eye.y, eye.z, 1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }

        let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);
        let screen = Vec2::new(
            self.vp_x as f32 + (ndc.x + 1.0) * 0.5 * self.vp_width as f32,
            self.vp_y as f32 + (ndc.y + 1.0) * 0.5 * self.vp_height as f32,
        );
        Some((screen, -eye.z))
    }

    /// Map a viewport point and camera-space depth back to world space
    pub fn un_project(&self, screen: &Vec2, depth: f32) -> Vec3 {
        let inverse_view = self.view_transform().inverse().to_homogeneous();
        self.un_project_with(screen, depth, &inverse_view)
    }

    /// [`Camera::un_project`] with an explicit camera-to-world matrix
    ///
    /// Useful when many points are unprojected against the same pose, or
    /// when the points were captured under a different pose than the
    /// camera's current one.
    pub fn un_project_with(&self, screen: &Vec2, depth: f32, inverse_view: &Mat4) -> Vec3 {
        let projection = self.projection_matrix();

        let ndc_x = 2.0 * (screen.x - self.vp_x as f32) / self.vp_width as f32 - 1.0;
        let ndc_y = 2.0 * (screen.y - self.vp_y as f32) / self.vp_height as f32 - 1.0;

        let eye = Vec4::new(
            ndc_x * depth / projection[(0, 0)],
            ndc_y * depth / projection[(1, 1)],
            -depth,
            1.0,
        );
        (inverse_view * eye).xyz()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
