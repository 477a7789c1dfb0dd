//! Cameras and the transform they expose to the binding system.
//!
//! A camera owns a composed translate/rotate/scale transform and a fixed
//! projection computed once at construction. Each simulation step the
//! scene asks [`Camera::update`] whether anything changed; only then is the
//! camera's matrix re-bound through the active shader, keyed by the
//! camera's [`OwnerId`].

pub mod effects;

use glam::{Mat4, Vec2, Vec3};

use crate::camera::effects::CameraEffects;
use crate::error::Error;
use crate::math::noise::PerlinNoise;
use crate::math::Axis;
use crate::shader::binding::{OwnerId, UniformBinding};

/// A translate × rotate × scale transform with dirty tracking.
///
/// The three sub-transforms are independent; mutators mark the transform
/// dirty and [`final_matrix`](Self::final_matrix) clears the flag as a side
/// effect — callers that need both the dirty check and the matrix must
/// read the flag first.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    scaling: Vec2,
    rotation: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// The identity transform, not dirty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            translation: Vec3::ZERO,
            scaling: Vec2::ONE,
            rotation: Mat4::IDENTITY,
            dirty: false,
        }
    }

    /// Move by `offset` (translations compose additively).
    pub fn translate(&mut self, offset: Vec2) {
        self.translation += Vec3::new(offset.x, offset.y, 0.0);
        self.dirty = true;
    }

    /// Jump to an absolute position.
    pub fn set_translation(&mut self, position: Vec2) {
        self.translation = Vec3::new(position.x, position.y, 0.0);
        self.dirty = true;
    }

    /// Current position.
    #[must_use]
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.translation.x, self.translation.y)
    }

    /// Multiply the current scale by `factor`, per axis.
    pub fn scale(&mut self, factor: Vec2) {
        self.scaling *= factor;
        self.dirty = true;
    }

    /// Jump to an absolute scale.
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scaling = scale;
        self.dirty = true;
    }

    /// Current scale.
    #[must_use]
    pub fn scaling(&self) -> Vec2 {
        self.scaling
    }

    /// Compose a rotation of `radians` about `axis` onto the current
    /// rotation.
    pub fn rotate(&mut self, radians: f32, axis: Axis) {
        self.rotation *= Self::rotation_about(radians, axis);
        self.dirty = true;
    }

    /// Replace the current rotation with `radians` about `axis`.
    pub fn set_rotation(&mut self, radians: f32, axis: Axis) {
        self.rotation = Self::rotation_about(radians, axis);
        self.dirty = true;
    }

    fn rotation_about(radians: f32, axis: Axis) -> Mat4 {
        match axis {
            Axis::X => Mat4::from_rotation_x(radians),
            Axis::Y => Mat4::from_rotation_y(radians),
            Axis::Z => Mat4::from_rotation_z(radians),
        }
    }

    /// Whether a mutation happened since the last
    /// [`final_matrix`](Self::final_matrix).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The composed `T * R * S` matrix. Clears the dirty flag.
    pub fn final_matrix(&mut self) -> Mat4 {
        self.dirty = false;
        Mat4::from_translation(self.translation)
            * self.rotation
            * Mat4::from_scale(Vec3::new(self.scaling.x, self.scaling.y, 1.0))
    }
}

/// A scene's viewpoint: transform plus fixed projection.
///
/// The scene only needs the change signal and the matrix payload; concrete
/// cameras add movement and effect APIs on top.
pub trait Camera {
    /// The id this camera's uniform binding is tagged with.
    fn id(&self) -> OwnerId;

    /// Advance effects and report whether the matrix changed since the
    /// last call. The change signal is consumed: with no new mutation the
    /// next call returns `false`.
    fn update(&mut self, dt: f32) -> bool;

    /// `transform.final_matrix() × projection`.
    fn matrix(&mut self) -> Mat4;

    /// The current matrix as a uniform binding tagged with this camera's
    /// id.
    fn uniform(&mut self) -> UniformBinding;

    /// The camera's transform.
    fn transform(&self) -> &Transform;

    /// The camera's transform, for direct movement.
    fn transform_mut(&mut self) -> &mut Transform;

    /// The camera's effect runner.
    fn effects_mut(&mut self) -> &mut CameraEffects;
}

/// Orthographic view volume, in the same units as world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    /// Left clipping plane.
    pub left: f32,
    /// Right clipping plane.
    pub right: f32,
    /// Top clipping plane.
    pub top: f32,
    /// Bottom clipping plane.
    pub bottom: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

/// Shared camera machinery: the projection never changes after
/// construction, and the combined matrix is cached until the transform
/// dirties.
struct ProjectedCamera {
    id: OwnerId,
    projection: Mat4,
    transform: Transform,
    effects: CameraEffects,
    cached: Mat4,
}

impl ProjectedCamera {
    fn new(projection: Mat4) -> Self {
        Self {
            id: OwnerId::next(),
            projection,
            transform: Transform::new(),
            effects: CameraEffects::new(),
            // Identity transform: the projection alone.
            cached: projection,
        }
    }

    fn matrix(&mut self) -> Mat4 {
        if self.transform.is_dirty() {
            self.cached = self.transform.final_matrix() * self.projection;
        }
        self.cached
    }

    fn update(&mut self, dt: f32) -> bool {
        self.effects.update(dt, &mut self.transform);
        let changed = self.transform.is_dirty();
        if changed {
            self.cached = self.transform.final_matrix() * self.projection;
        }
        changed || self.effects.animating()
    }

    fn uniform(&mut self) -> UniformBinding {
        UniformBinding::new(self.id, self.matrix().into())
    }
}

/// A 2D camera over an orthographic projection.
pub struct OrthographicCamera {
    body: ProjectedCamera,
}

impl OrthographicCamera {
    /// A camera whose projection is computed once from `bounds` via the
    /// standard orthographic formula.
    #[must_use]
    pub fn new(bounds: OrthoBounds) -> Self {
        Self {
            body: ProjectedCamera::new(Mat4::orthographic_rh_gl(
                bounds.left,
                bounds.right,
                bounds.bottom,
                bounds.top,
                bounds.near,
                bounds.far,
            )),
        }
    }

    /// Glide the camera by `offset` over `duration_ms`.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn pan(&mut self, offset: Vec2, duration_ms: f32, force: bool) -> Result<(), Error> {
        self.body.effects.pan(offset, duration_ms, force)
    }

    /// Glide the camera's scale to `scale` over `duration_ms`.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn zoom(&mut self, scale: Vec2, duration_ms: f32, force: bool) -> Result<(), Error> {
        self.body.effects.zoom(scale, duration_ms, force)
    }

    /// Jitter the camera with `noise` for `duration_ms`, restoring its
    /// pose afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn shake(
        &mut self,
        duration_ms: f32,
        intensity: f32,
        damping: f32,
        noise: PerlinNoise,
        force: bool,
    ) -> Result<(), Error> {
        self.body
            .effects
            .shake(duration_ms, intensity, damping, noise, force)
    }

    /// Whether a camera effect is running.
    #[must_use]
    pub fn animating(&self) -> bool {
        self.body.effects.animating()
    }
}

impl Camera for OrthographicCamera {
    fn id(&self) -> OwnerId {
        self.body.id
    }

    fn update(&mut self, dt: f32) -> bool {
        self.body.update(dt)
    }

    fn matrix(&mut self) -> Mat4 {
        self.body.matrix()
    }

    fn uniform(&mut self) -> UniformBinding {
        self.body.uniform()
    }

    fn transform(&self) -> &Transform {
        &self.body.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.body.transform
    }

    fn effects_mut(&mut self) -> &mut CameraEffects {
        &mut self.body.effects
    }
}

/// A camera over a perspective projection, for depth-styled 2D scenes.
pub struct PerspectiveCamera {
    body: ProjectedCamera,
}

impl PerspectiveCamera {
    /// A camera whose projection is computed once from a vertical field of
    /// view (radians), aspect ratio, and near/far planes.
    #[must_use]
    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            body: ProjectedCamera::new(Mat4::perspective_rh_gl(fov_y, aspect, near, far)),
        }
    }

    /// Glide the camera by `offset` over `duration_ms`.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn pan(&mut self, offset: Vec2, duration_ms: f32, force: bool) -> Result<(), Error> {
        self.body.effects.pan(offset, duration_ms, force)
    }

    /// Glide the camera's scale to `scale` over `duration_ms`.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn zoom(&mut self, scale: Vec2, duration_ms: f32, force: bool) -> Result<(), Error> {
        self.body.effects.zoom(scale, duration_ms, force)
    }

    /// Jitter the camera with `noise` for `duration_ms`, restoring its
    /// pose afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn shake(
        &mut self,
        duration_ms: f32,
        intensity: f32,
        damping: f32,
        noise: PerlinNoise,
        force: bool,
    ) -> Result<(), Error> {
        self.body
            .effects
            .shake(duration_ms, intensity, damping, noise, force)
    }

    /// Whether a camera effect is running.
    #[must_use]
    pub fn animating(&self) -> bool {
        self.body.effects.animating()
    }
}

impl Camera for PerspectiveCamera {
    fn id(&self) -> OwnerId {
        self.body.id
    }

    fn update(&mut self, dt: f32) -> bool {
        self.body.update(dt)
    }

    fn matrix(&mut self) -> Mat4 {
        self.body.matrix()
    }

    fn uniform(&mut self) -> UniformBinding {
        self.body.uniform()
    }

    fn transform(&self) -> &Transform {
        &self.body.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.body.transform
    }

    fn effects_mut(&mut self) -> &mut CameraEffects {
        &mut self.body.effects
    }
}
