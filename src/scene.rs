//! The scene: one shader, an ordered list of drawables, an optional
//! camera.
//!
//! The driving engine calls [`Scene::initialize`] then [`Scene::render`]
//! every frame, with zero or more [`Scene::update_simulation_step`] calls
//! in between to catch the simulation up to real time. Rendering is one
//! unbatched triangle-strip draw call per drawable, in insertion order.

use log::{trace, warn};

use crate::api::GraphicsApi;
use crate::camera::Camera;
use crate::error::Error;
use crate::renderable::Renderable;
use crate::shader::binding::{OwnerId, UniformBinding, UniformPayload};
use crate::shader::{source, ShaderProgram};

/// A drawable collection rendered through a single shader program.
///
/// A new scene starts on the built-in shader (parsed, not yet compiled);
/// drawables and cameras added while it is active are bound to the
/// default variable names automatically. After
/// [`set_shader`](Self::set_shader) the caller owns all binding explicitly
/// via [`shader_mut`](Self::shader_mut).
pub struct Scene<G: GraphicsApi> {
    gl: G,
    shader: ShaderProgram<G>,
    renderables: Vec<Box<dyn Renderable<G>>>,
    camera: Option<Box<dyn Camera>>,
    shader_dirty: bool,
    using_default_shader: bool,
    /// Owner id for the scene's ambient uniforms (model transform, alpha).
    ambient: OwnerId,
}

impl<G: GraphicsApi> Scene<G> {
    /// A scene on the built-in shader.
    ///
    /// The shader is parsed but not compiled; the first
    /// [`initialize`](Self::initialize) links it. The scene's ambient
    /// uniforms (identity `modelview`, `alpha` of 1.0) are seeded so the
    /// default pipeline draws at full opacity without further setup.
    #[must_use]
    pub fn new(gl: G) -> Self {
        let mut shader = ShaderProgram::with_default_sources();
        let ambient = OwnerId::next();
        shader
            .set_uniform_data(
                &gl,
                source::DEFAULT_MODELVIEW_UNIFORM,
                UniformBinding::new(ambient, glam::Mat4::IDENTITY.into()),
            )
            .expect("built-in shader declares modelview");
        shader
            .set_uniform_data(
                &gl,
                source::DEFAULT_ALPHA_UNIFORM,
                UniformBinding::new(ambient, UniformPayload::Scalar(1.0)),
            )
            .expect("built-in shader declares alpha");

        Self {
            gl,
            shader,
            renderables: Vec::new(),
            camera: None,
            shader_dirty: true,
            using_default_shader: true,
            ambient,
        }
    }

    /// Append a drawable to the render order.
    ///
    /// While the scene is on the default shader, the drawable's position,
    /// texture, and color layouts are registered against the default
    /// attribute names. On a custom shader nothing is auto-bound; bind
    /// through [`shader_mut`](Self::shader_mut) instead.
    ///
    /// # Errors
    ///
    /// Propagates binding failures ([`Error::UnknownVariable`],
    /// [`Error::UnresolvedLocation`]); the drawable is not added in that
    /// case.
    pub fn add_drawable(&mut self, drawable: Box<dyn Renderable<G>>) -> Result<(), Error> {
        if self.using_default_shader {
            self.shader.set_attribute_data(
                &self.gl,
                source::DEFAULT_POSITION_ATTRIBUTE,
                drawable.position_layout(),
            )?;
            self.shader.set_attribute_data(
                &self.gl,
                source::DEFAULT_TEXTURE_ATTRIBUTE,
                drawable.texture_layout(),
            )?;
            self.shader.set_attribute_data(
                &self.gl,
                source::DEFAULT_COLOR_ATTRIBUTE,
                drawable.color_layout(),
            )?;
        }
        self.renderables.push(drawable);
        Ok(())
    }

    /// Append several drawables in order.
    ///
    /// # Errors
    ///
    /// Stops at the first binding failure; earlier drawables stay added.
    pub fn add_drawables(
        &mut self,
        drawables: impl IntoIterator<Item = Box<dyn Renderable<G>>>,
    ) -> Result<(), Error> {
        for drawable in drawables {
            self.add_drawable(drawable)?;
        }
        Ok(())
    }

    /// Install the scene's camera (replacing any previous one).
    ///
    /// While the scene is on the default shader, the camera's matrix is
    /// bound to the default camera uniform.
    ///
    /// # Errors
    ///
    /// Propagates binding failures from the eager default binding.
    pub fn add_camera(&mut self, mut camera: Box<dyn Camera>) -> Result<(), Error> {
        if self.using_default_shader {
            let binding = camera.uniform();
            self.shader
                .set_uniform_data(&self.gl, source::DEFAULT_CAMERA_UNIFORM, binding)?;
        }
        self.camera = Some(camera);
        Ok(())
    }

    /// The scene's camera, if one was added.
    pub fn camera_mut(&mut self) -> Option<&mut (dyn Camera + 'static)> {
        self.camera.as_deref_mut()
    }

    /// Replace the scene's shader.
    ///
    /// The outgoing program is torn down first ([`ShaderProgram::clear`]) —
    /// a scene never leaks its GPU program. The incoming shader is not
    /// compiled here; the next [`initialize`](Self::initialize) links it.
    pub fn set_shader(&mut self, shader: ShaderProgram<G>) {
        self.shader.clear(&self.gl);
        self.shader = shader;
        self.shader_dirty = true;
        self.using_default_shader = false;
    }

    /// The active shader.
    #[must_use]
    pub fn shader(&self) -> &ShaderProgram<G> {
        &self.shader
    }

    /// The active shader, for explicit binding against a custom program.
    pub fn shader_mut(&mut self) -> &mut ShaderProgram<G> {
        &mut self.shader
    }

    /// Compile and link the active shader if it changed; otherwise a
    /// no-op. The driving engine calls this before every render.
    ///
    /// # Errors
    ///
    /// Propagates [`ShaderProgram::initialize`] failures; the shader stays
    /// marked dirty so a corrected program can be retried.
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.shader_dirty {
            self.shader.initialize(&self.gl)?;
            self.shader_dirty = false;
        }
        Ok(())
    }

    /// Advance the simulation by one fixed step of `dt` milliseconds.
    ///
    /// If the camera reports a change, its matrix is pushed through
    /// whichever uniform name its id is bound to. Without a camera (or
    /// with a camera whose uniform was never bound) this is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates uniform upload failures.
    pub fn update_simulation_step(&mut self, dt: f32) -> Result<(), Error> {
        let Some(camera) = self.camera.as_deref_mut() else {
            return Ok(());
        };
        if camera.update(dt) {
            let Some(name) = self.shader.name_for_owner(camera.id()) else {
                trace!("camera changed but no uniform is bound to it; skipping push");
                return Ok(());
            };
            let name = name.to_owned();
            let binding = camera.uniform();
            self.shader.set_uniform_data(&self.gl, &name, binding)?;
            trace!("camera matrix pushed to uniform `{name}`");
        }
        Ok(())
    }

    /// Draw every drawable, in insertion order, one triangle-strip call
    /// each.
    ///
    /// Per drawable: fetch its resolved attribute bindings from the
    /// shader, enable + upload its buffer, draw, disable. No z-sorting,
    /// no batching. A scene with no drawables or no camera renders
    /// without error.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if a drawable's GPU buffer cannot be created.
    pub fn render(&mut self) -> Result<(), Error> {
        if !self.shader.is_initialized() {
            if !self.renderables.is_empty() {
                warn!("scene rendered before its shader was initialized; skipping frame");
            }
            return Ok(());
        }

        self.shader.bind(&self.gl);
        for renderable in &mut self.renderables {
            let bindings = self.shader.attribute_bindings_for(renderable.id());
            renderable.enable_buffer_data(&self.gl, &bindings)?;
            self.gl.draw_triangle_strip(0, renderable.vertex_count());
            renderable.disable_buffer(&self.gl, &bindings);
        }
        Ok(())
    }

    /// The owner id of the scene's ambient uniform bindings.
    #[must_use]
    pub fn ambient_id(&self) -> OwnerId {
        self.ambient
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingApi;
    use crate::camera::{OrthoBounds, OrthographicCamera};
    use crate::renderable::{Mesh, Quad, TileOptions};
    use glam::Vec2;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn camera() -> Box<OrthographicCamera> {
        Box::new(OrthographicCamera::new(OrthoBounds {
            left: 0.0,
            right: 800.0,
            top: 0.0,
            bottom: 600.0,
            near: -1.0,
            far: 1.0,
        }))
    }

    #[test]
    fn empty_scene_updates_and_renders_without_error() {
        init_logs();
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());

        // Never initialized: still fine.
        scene.update_simulation_step(16.0).unwrap();
        scene.render().unwrap();

        // Initialized but still empty and cameraless: also fine.
        scene.initialize().unwrap();
        scene.update_simulation_step(16.0).unwrap();
        scene.render().unwrap();
        assert!(gl.state.borrow().draws.is_empty());
    }

    #[test]
    fn default_shader_binds_drawables_eagerly() {
        init_logs();
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        let quad = Quad::new(0.0, 0.0, 32.0, 32.0);
        scene.add_drawable(Box::new(quad)).unwrap();
        scene.initialize().unwrap();
        scene.render().unwrap();

        let state = gl.state.borrow();
        assert_eq!(state.draws, vec![(0, 4)]);
        // Position, texture, and color arrays described and paired.
        assert_eq!(state.attrib_pointers.len(), 3);
        assert_eq!(state.enabled_arrays.len(), 3);
        assert_eq!(state.disabled_arrays.len(), 3);
    }

    #[test]
    fn render_issues_one_strip_per_drawable_in_order() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        scene
            .add_drawable(Box::new(Quad::<RecordingApi>::new(0.0, 0.0, 8.0, 8.0)))
            .unwrap();
        scene
            .add_drawable(Box::new(Mesh::<RecordingApi>::new(
                0.0,
                0.0,
                TileOptions {
                    row_count: 2,
                    column_count: 3,
                    tile_width: 16.0,
                    tile_height: 16.0,
                },
            )))
            .unwrap();
        scene.initialize().unwrap();
        scene.render().unwrap();

        // The 2x3 mesh carries one degenerate stitch: 26 records.
        assert_eq!(gl.state.borrow().draws, vec![(0, 4), (0, 26)]);
    }

    #[test]
    fn camera_updates_push_through_the_bound_uniform() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        scene.add_camera(camera()).unwrap();
        scene.initialize().unwrap();

        let uploads_after_init = gl.state.borrow().uniform_uploads.len();

        // No movement: no push.
        scene.update_simulation_step(16.0).unwrap();
        assert_eq!(gl.state.borrow().uniform_uploads.len(), uploads_after_init);

        // Movement: exactly one push, then quiet again.
        scene
            .camera_mut()
            .unwrap()
            .transform_mut()
            .translate(Vec2::new(12.0, 0.0));
        scene.update_simulation_step(16.0).unwrap();
        assert_eq!(
            gl.state.borrow().uniform_uploads.len(),
            uploads_after_init + 1
        );
        scene.update_simulation_step(16.0).unwrap();
        assert_eq!(
            gl.state.borrow().uniform_uploads.len(),
            uploads_after_init + 1
        );

        // The camera uniform location was resolved exactly once in all of
        // this.
        let lookups = gl.state.borrow().uniform_lookups.clone();
        assert_eq!(lookups.iter().filter(|n| *n == "camera").count(), 1);
    }

    #[test]
    fn ambient_uniforms_upload_at_initialize() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        scene.initialize().unwrap();

        let state = gl.state.borrow();
        // Identity modelview (16 floats) and alpha (1.0).
        assert!(state
            .uniform_uploads
            .iter()
            .any(|(_, values)| values.len() == 16));
        assert!(state
            .uniform_uploads
            .iter()
            .any(|(_, values)| values == &vec![1.0]));
    }

    #[test]
    fn set_shader_tears_down_the_outgoing_program() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        scene.initialize().unwrap();
        assert!(scene.shader().is_initialized());

        let mut custom = ShaderProgram::new();
        custom
            .set_source(
                "attribute vec2 aPos;\nvoid main() { gl_Position = vec4(aPos, 0.0, 1.0); }\n",
                "void main() { gl_FragColor = vec4(1.0); }\n",
            )
            .unwrap();
        scene.set_shader(custom);

        // The default program was deleted, and the new one is not yet
        // compiled.
        assert_eq!(gl.state.borrow().deleted_programs.len(), 1);
        assert!(!scene.shader().is_initialized());

        scene.initialize().unwrap();
        assert!(scene.shader().is_initialized());
    }

    #[test]
    fn custom_shader_skips_auto_binding() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        let mut custom = ShaderProgram::new();
        custom
            .set_source(
                "attribute vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }\n",
                "void main() { gl_FragColor = vec4(1.0); }\n",
            )
            .unwrap();
        scene.set_shader(custom);

        // The custom shader has none of the default names; the add still
        // succeeds because nothing is auto-bound.
        let quad: Quad<RecordingApi> = Quad::new(0.0, 0.0, 8.0, 8.0);
        let id = quad.id();
        scene.add_drawable(Box::new(quad)).unwrap();

        // Bind explicitly through the shader instead.
        let layout = crate::renderable::position_layout(id);
        scene
            .shader_mut()
            .set_attribute_data(&gl, "position", layout)
            .unwrap();
        scene.initialize().unwrap();
        scene.render().unwrap();
        assert_eq!(gl.state.borrow().draws, vec![(0, 4)]);
    }

    #[test]
    fn render_before_initialize_draws_nothing() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        scene
            .add_drawable(Box::new(Quad::<RecordingApi>::new(0.0, 0.0, 8.0, 8.0)))
            .unwrap();
        scene.render().unwrap();
        assert!(gl.state.borrow().draws.is_empty());
    }

    #[test]
    fn camera_effects_drive_uniform_pushes_every_step() {
        let gl = RecordingApi::new();
        let mut scene = Scene::new(gl.clone());
        scene.add_camera(camera()).unwrap();
        scene.initialize().unwrap();
        let baseline = gl.state.borrow().uniform_uploads.len();

        scene
            .camera_mut()
            .unwrap()
            .effects_mut()
            .pan(Vec2::new(50.0, 0.0), 48.0, false)
            .unwrap();

        for _ in 0..5 {
            scene.update_simulation_step(16.0).unwrap();
        }
        let pushed = gl.state.borrow().uniform_uploads.len() - baseline;
        assert!(pushed >= 3, "expected a push per effect step, got {pushed}");

        // Effect finished: no more pushes.
        let settled = gl.state.borrow().uniform_uploads.len();
        scene.update_simulation_step(16.0).unwrap();
        assert_eq!(gl.state.borrow().uniform_uploads.len(), settled);
    }
}
