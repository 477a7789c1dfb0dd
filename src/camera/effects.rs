//! Timed camera effects: pan, zoom, shake.
//!
//! Effects mutate the camera's [`Transform`] each simulation step and
//! resolve synchronously — the scene only ever sees "did the transform
//! change this step". Starting an effect while another runs is rejected
//! unless `force` is passed, in which case the running set is cancelled
//! and replaced; effects are never queued or stacked.

use glam::Vec2;
use log::debug;

use crate::camera::Transform;
use crate::error::Error;
use crate::math::noise::PerlinNoise;
use crate::math::{lerp_vec2, smooth_step, to_radian, Axis};

/// Noise-field traversal speed for the shake effect, in field units per
/// millisecond.
const SHAKE_FREQUENCY: f32 = 0.02;

trait Effect {
    /// Advance by `dt` milliseconds, mutating the camera transform.
    fn update(&mut self, dt: f32, transform: &mut Transform);

    /// Whether the effect still has work to do.
    fn animating(&self) -> bool;
}

/// The camera's effect runner.
///
/// At most one effect runs at a time; see the module docs for the
/// concurrency policy.
#[derive(Default)]
pub struct CameraEffects {
    running: Vec<Box<dyn Effect>>,
}

impl CameraEffects {
    /// An idle runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&mut self, effect: Box<dyn Effect>, force: bool) -> Result<(), Error> {
        if !self.running.is_empty() {
            if !force {
                return Err(Error::EffectInProgress);
            }
            debug!(
                "camera effect forced; cancelling {} running effect(s)",
                self.running.len()
            );
            self.running.clear();
        }
        self.running.push(effect);
        Ok(())
    }

    /// Glide the camera by `offset` over `duration_ms` along a smooth-step
    /// curve.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn pan(&mut self, offset: Vec2, duration_ms: f32, force: bool) -> Result<(), Error> {
        self.begin(Box::new(PanEffect::new(offset, duration_ms)), force)
    }

    /// Glide the camera's scale to the absolute `scale` over `duration_ms`.
    ///
    /// # Errors
    ///
    /// [`Error::EffectInProgress`] if another effect is running and `force`
    /// is false.
    pub fn zoom(&mut self, scale: Vec2, duration_ms: f32, force: bool) -> Result<(), Error> {
        self.begin(Box::new(ZoomEffect::new(scale, duration_ms)), force)
    }

    /// Jitter the camera's position and roll with Perlin noise for
    /// `duration_ms`, restoring the original pose on completion.
    ///
    /// `intensity` is the maximum offset in world units; `damping` shapes
    /// how quickly the amplitude decays over the effect's lifetime (1.0 is
    /// linear; larger dies off sooner). The noise generator is passed in
    /// so a seeded one reproduces the same trajectory.
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
        self.begin(
            Box::new(ShakeEffect::new(duration_ms, intensity, damping, noise)),
            force,
        )
    }

    /// Advance every running effect and drop the finished ones.
    pub fn update(&mut self, dt: f32, transform: &mut Transform) {
        for effect in &mut self.running {
            effect.update(dt, transform);
        }
        self.running.retain(|effect| effect.animating());
    }

    /// Whether any effect is running.
    #[must_use]
    pub fn animating(&self) -> bool {
        !self.running.is_empty()
    }
}

/// Smooth-step glide of the translation to `start + offset`.
struct PanEffect {
    offset: Vec2,
    /// Captured from the transform on first update.
    end: Option<Vec2>,
    current: Vec2,
    accumulated: f32,
    duration: f32,
    animating: bool,
}

impl PanEffect {
    fn new(offset: Vec2, duration: f32) -> Self {
        Self {
            offset,
            end: None,
            current: Vec2::ZERO,
            accumulated: 0.0,
            duration,
            animating: true,
        }
    }
}

impl Effect for PanEffect {
    fn update(&mut self, dt: f32, transform: &mut Transform) {
        if !self.animating {
            return;
        }
        if self.end.is_none() {
            self.current = transform.translation();
            self.end = Some(self.current + self.offset);
        }
        let Some(end) = self.end else { return };

        if self.accumulated >= self.duration {
            transform.set_translation(end);
            self.animating = false;
            return;
        }

        self.accumulated += dt;
        let t = smooth_step(self.accumulated / self.duration);
        self.current = lerp_vec2(self.current, end, t);
        transform.set_translation(self.current);
    }

    fn animating(&self) -> bool {
        self.animating
    }
}

/// Smooth-step glide of the scale to an absolute target.
struct ZoomEffect {
    target: Vec2,
    current: Option<Vec2>,
    accumulated: f32,
    duration: f32,
    animating: bool,
}

impl ZoomEffect {
    fn new(target: Vec2, duration: f32) -> Self {
        Self {
            target,
            current: None,
            accumulated: 0.0,
            duration,
            animating: true,
        }
    }
}

impl Effect for ZoomEffect {
    fn update(&mut self, dt: f32, transform: &mut Transform) {
        if !self.animating {
            return;
        }
        let current = *self.current.get_or_insert(transform.scaling());

        if self.accumulated >= self.duration {
            transform.set_scale(self.target);
            self.animating = false;
            return;
        }

        self.accumulated += dt;
        let t = smooth_step(self.accumulated / self.duration);
        let next = lerp_vec2(current, self.target, t);
        self.current = Some(next);
        transform.set_scale(next);
    }

    fn animating(&self) -> bool {
        self.animating
    }
}

/// Perlin-noise jitter of position and roll, restoring the pose at the
/// end.
struct ShakeEffect {
    duration: f32,
    intensity: f32,
    damping: f32,
    accumulated: f32,
    /// Captured from the transform on first update.
    origin: Option<Vec2>,
    noise: PerlinNoise,
    animating: bool,
}

impl ShakeEffect {
    fn new(duration: f32, intensity: f32, damping: f32, noise: PerlinNoise) -> Self {
        Self {
            duration,
            intensity,
            damping,
            accumulated: 0.0,
            origin: None,
            noise,
            animating: true,
        }
    }
}

impl Effect for ShakeEffect {
    fn update(&mut self, dt: f32, transform: &mut Transform) {
        if !self.animating {
            return;
        }
        let origin = *self.origin.get_or_insert(transform.translation());

        if self.accumulated >= self.duration {
            transform.set_translation(origin);
            transform.set_rotation(0.0, Axis::Z);
            self.animating = false;
            return;
        }

        self.accumulated += dt;
        let progress = (self.accumulated / self.duration).min(1.0);
        let amplitude = self.intensity * (1.0 - progress).max(0.0).powf(self.damping);

        // Two decorrelated channels from one noise field.
        let along = self.accumulated * SHAKE_FREQUENCY;
        let nx = self.noise.sample(along, 0.5);
        let ny = self.noise.sample(0.5, along);

        transform.set_translation(origin + Vec2::new(nx, ny) * amplitude);
        transform.set_rotation(to_radian(nx * amplitude), Axis::Z);
    }

    fn animating(&self) -> bool {
        self.animating
    }
}
