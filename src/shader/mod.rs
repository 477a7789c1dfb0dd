//! Shader programs and the variable binding system.
//!
//! A [`ShaderProgram`] owns the source text for one vertex and one fragment
//! stage, discovers the bindable variable names by lexing that text, and
//! routes owner-tagged data to the GPU: layout descriptors and constants
//! for attributes, vectors and matrices for uniforms. GPU locations resolve
//! lazily, exactly once per variable, on first bind after the program
//! links. One program is shared by every drawable in a scene; data is
//! disambiguated by [`OwnerId`].

pub mod binding;
pub mod parse;
pub mod source;

mod attribute;
mod uniform;

pub use attribute::AttributeRegistry;
pub use binding::{
    AttributeBinding, AttributeSource, ConstantValue, OwnerId, ResolvedBinding, UniformBinding,
    UniformPayload, VertexLayout,
};
pub use uniform::UniformRegistry;

use log::debug;

use crate::api::{GraphicsApi, ShaderStage};
use crate::error::Error;
use crate::shader::parse::Qualifier;

/// A compiled-and-linked GPU program plus the registries that bind data to
/// its declared variables.
///
/// # Lifecycle
///
/// ```text
/// new / set_source          initialize(gl)            clear(gl)
///   (Parsed: names known) ──────────────────▶ (Ready) ─────────▶ (empty)
/// ```
///
/// Data bound while still parsed is queued and replayed during
/// `initialize`; data bound afterwards uploads immediately. A program owns
/// its GPU objects exclusively and must be torn down with
/// [`clear`](Self::clear) before being discarded or replaced.
pub struct ShaderProgram<G: GraphicsApi> {
    vertex_source: String,
    fragment_source: String,
    program: Option<G::Program>,
    /// Stage objects stay attached for the program's lifetime and are
    /// detached + deleted at `clear`.
    stages: Vec<G::Shader>,
    attributes: AttributeRegistry,
    uniforms: UniformRegistry<G>,
}

impl<G: GraphicsApi> Default for ShaderProgram<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GraphicsApi> ShaderProgram<G> {
    /// An empty program with no sources and no declared variables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex_source: String::new(),
            fragment_source: String::new(),
            program: None,
            stages: Vec::new(),
            attributes: AttributeRegistry::new(),
            uniforms: UniformRegistry::new(),
        }
    }

    /// A program parsed from the built-in position/texture/color shader
    /// pair (not yet compiled).
    #[must_use]
    pub fn with_default_sources() -> Self {
        let mut shader = Self::new();
        shader
            .set_source(source::DEFAULT_VERTEX_SOURCE, source::DEFAULT_FRAGMENT_SOURCE)
            .expect("built-in shader sources always lex");
        shader
    }

    /// Replace both stage sources and re-discover the declared variables.
    ///
    /// Any previously registered entries (and their bound data) are
    /// dropped. A variable declared in both stages shares one registry
    /// entry. `varying` declarations are validated but not bindable.
    ///
    /// # Errors
    ///
    /// [`Error::ShaderParse`] if either source contains a malformed
    /// declaration line; the program is left unchanged in that case.
    pub fn set_source(&mut self, vertex: &str, fragment: &str) -> Result<(), Error> {
        let vertex_decls = parse::scan_declarations(vertex)?;
        let fragment_decls = parse::scan_declarations(fragment)?;

        self.attributes.clear();
        self.uniforms.clear();
        for decl in vertex_decls.iter().chain(&fragment_decls) {
            match decl.qualifier {
                Qualifier::Attribute => self.attributes.declare(&decl.ty, &decl.name),
                Qualifier::Uniform => self.uniforms.declare(&decl.ty, &decl.name),
                // Read-only interpolated values; nothing to bind.
                Qualifier::Varying => {}
            }
        }
        self.vertex_source = vertex.to_owned();
        self.fragment_source = fragment.to_owned();
        Ok(())
    }

    /// Compile both stages, link the program, and replay any queued
    /// bindings.
    ///
    /// A no-op if the program is already linked. Declared variables with no
    /// data stay unresolved (with a warning); declared variables *with*
    /// data must resolve.
    ///
    /// # Errors
    ///
    /// [`Error::ShaderCompile`] / [`Error::ShaderLink`] on driver
    /// rejection — fatal to this program; [`Error::UnresolvedLocation`] if
    /// the linker dropped a data-bound variable; [`Error::Resource`] if an
    /// object could not be created. Partial GPU objects are released
    /// before returning.
    pub fn initialize(&mut self, gl: &G) -> Result<(), Error> {
        if self.program.is_some() {
            return Ok(());
        }

        let vertex = Self::compile_stage(gl, ShaderStage::Vertex, &self.vertex_source)?;
        let fragment = match Self::compile_stage(gl, ShaderStage::Fragment, &self.fragment_source)
        {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(err) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(err);
            }
        };

        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);

        if !gl.program_link_status(program) {
            let info_log = gl.program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            return Err(Error::ShaderLink { info_log });
        }

        self.program = Some(program);
        self.stages = vec![vertex, fragment];

        self.attributes.initialize(gl, program)?;
        self.uniforms.initialize(gl, program)?;

        debug!(
            "shader program linked ({} attributes, {} uniforms)",
            self.attributes.len(),
            self.uniforms.len()
        );
        Ok(())
    }

    fn compile_stage(gl: &G, stage: ShaderStage, source: &str) -> Result<G::Shader, Error> {
        let shader = gl.create_shader(stage)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.shader_compile_status(shader) {
            let info_log = gl.shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(Error::ShaderCompile { stage, info_log });
        }
        Ok(shader)
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.program.is_some()
    }

    /// Bind the program for drawing, if it is linked.
    pub fn bind(&self, gl: &G) {
        if let Some(program) = self.program {
            gl.use_program(Some(program));
        }
    }

    /// Bind one owner's attribute data to a declared attribute name.
    ///
    /// Queued while the program is un-linked; resolved and (for constants)
    /// uploaded immediately once linked. Re-binding for the same owner
    /// replaces that owner's entry.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownVariable`] for names absent from the parsed source;
    /// [`Error::UnresolvedLocation`] if the linker dropped the variable.
    pub fn set_attribute_data(
        &mut self,
        gl: &G,
        name: &str,
        binding: AttributeBinding,
    ) -> Result<(), Error> {
        let linked = self.program.map(|program| (gl, program));
        self.attributes.set_data(linked, name, binding)
    }

    /// Bind one owner's uniform payload to a declared uniform name.
    ///
    /// Same queue/upload and replace-by-owner semantics as
    /// [`set_attribute_data`](Self::set_attribute_data).
    ///
    /// # Errors
    ///
    /// [`Error::UnknownVariable`] for names absent from the parsed source;
    /// [`Error::UnresolvedLocation`] if the linker dropped the variable.
    pub fn set_uniform_data(
        &mut self,
        gl: &G,
        name: &str,
        binding: UniformBinding,
    ) -> Result<(), Error> {
        let linked = self.program.map(|program| (gl, program));
        self.uniforms.set_data(linked, name, binding)
    }

    /// The variable name `owner` has data bound to, uniforms first.
    ///
    /// `None` is not an error — e.g. a drawable has no uniform bound to it.
    #[must_use]
    pub fn name_for_owner(&self, owner: OwnerId) -> Option<&str> {
        self.uniforms
            .name_for_owner(owner)
            .or_else(|| self.attributes.name_for_owner(owner))
    }

    /// Every resolved attribute binding tagged with `owner`, for its draw
    /// pass. Empty if the owner bound nothing (not an error).
    #[must_use]
    pub fn attribute_bindings_for(&self, owner: OwnerId) -> Vec<ResolvedBinding> {
        self.attributes.bindings_for_owner(owner)
    }

    /// The attribute registry (declared names and bound data).
    #[must_use]
    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    /// The uniform registry (declared names and bound data).
    #[must_use]
    pub fn uniforms(&self) -> &UniformRegistry<G> {
        &self.uniforms
    }

    /// Release the GPU program and empty both registries.
    ///
    /// Detaches and deletes both stage objects, then the program. Safe to
    /// call repeatedly and on a program that was never initialized.
    pub fn clear(&mut self, gl: &G) {
        if let Some(program) = self.program.take() {
            for shader in self.stages.drain(..) {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            gl.delete_program(program);
            debug!("shader program destroyed");
        }
        self.stages.clear();
        self.attributes.clear();
        self.uniforms.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingApi;

    const VERTEX: &str = "\
attribute vec2 aPos;
uniform mat4 camera;
varying vec2 vTex;

void main() {
    vTex = aPos;
    gl_Position = camera * vec4(aPos, 0.0, 1.0);
}
";

    const FRAGMENT: &str = "\
precision mediump float;

varying vec2 vTex;

void main() {
    gl_FragColor = vec4(vTex, 0.0, 1.0);
}
";

    fn layout_binding(owner: OwnerId) -> AttributeBinding {
        AttributeBinding::layout(
            owner,
            VertexLayout {
                size: 2,
                normalized: false,
                stride: 32,
                offset: 0,
            },
        )
    }

    fn parsed_program() -> ShaderProgram<RecordingApi> {
        let mut shader = ShaderProgram::new();
        shader.set_source(VERTEX, FRAGMENT).unwrap();
        shader
    }

    #[test]
    fn parsing_populates_exactly_the_bindable_names() {
        let shader = parsed_program();
        assert_eq!(shader.attributes().len(), 1);
        assert!(shader.attributes().has("aPos"));
        assert_eq!(shader.uniforms().len(), 1);
        assert!(shader.uniforms().has("camera"));
        // Varyings are not bindable in either registry.
        assert!(!shader.attributes().has("vTex"));
        assert!(!shader.uniforms().has("vTex"));
    }

    #[test]
    fn commented_declarations_produce_no_entries() {
        let mut shader = ShaderProgram::<RecordingApi>::new();
        shader
            .set_source(
                "// attribute vec2 ignored;\n/* attribute vec2 alsoIgnored; */\n",
                "",
            )
            .unwrap();
        assert!(shader.attributes().is_empty());
        assert!(shader.uniforms().is_empty());
    }

    #[test]
    fn set_source_rejects_multi_declaration_lines() {
        let mut shader = ShaderProgram::<RecordingApi>::new();
        let err = shader.set_source("uniform float a, b;", "").unwrap_err();
        assert!(matches!(err, Error::ShaderParse { .. }));
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let gl = RecordingApi::new();
        let mut shader = parsed_program();
        let err = shader
            .set_attribute_data(&gl, "nonexistent", layout_binding(OwnerId::next()))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownVariable { .. }));
    }

    #[test]
    fn queued_bindings_replay_at_initialize() {
        let gl = RecordingApi::new();
        let mut shader = parsed_program();
        let drawable = OwnerId::next();
        let camera = OwnerId::next();

        shader
            .set_attribute_data(&gl, "aPos", layout_binding(drawable))
            .unwrap();
        shader
            .set_uniform_data(
                &gl,
                "camera",
                UniformBinding::new(camera, UniformPayload::Mat4([1.0; 16])),
            )
            .unwrap();
        // Nothing touched the GPU yet.
        assert!(gl.state.borrow().uniform_uploads.is_empty());

        shader.initialize(&gl).unwrap();

        let state = gl.state.borrow();
        assert_eq!(state.attrib_lookups, vec!["aPos"]);
        assert_eq!(state.uniform_lookups, vec!["camera"]);
        assert_eq!(state.uniform_uploads.len(), 1);
    }

    #[test]
    fn location_resolution_is_idempotent_after_initialize() {
        let gl = RecordingApi::new();
        let mut shader = parsed_program();
        let camera = OwnerId::next();
        shader
            .set_uniform_data(
                &gl,
                "camera",
                UniformBinding::new(camera, UniformPayload::Mat4([1.0; 16])),
            )
            .unwrap();
        shader.initialize(&gl).unwrap();

        shader
            .set_uniform_data(
                &gl,
                "camera",
                UniformBinding::new(camera, UniformPayload::Mat4([2.0; 16])),
            )
            .unwrap();
        shader
            .set_uniform_data(
                &gl,
                "camera",
                UniformBinding::new(camera, UniformPayload::Mat4([3.0; 16])),
            )
            .unwrap();

        let state = gl.state.borrow();
        assert_eq!(state.uniform_lookups.len(), 1);
        assert_eq!(state.uniform_uploads.len(), 3);
    }

    #[test]
    fn compile_failure_names_the_stage() {
        let gl = RecordingApi::new();
        gl.state.borrow_mut().fail_compile = Some("0:3 bad token".into());
        let mut shader = parsed_program();
        let err = shader.initialize(&gl).unwrap_err();
        assert!(matches!(
            err,
            Error::ShaderCompile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert!(!shader.is_initialized());
    }

    #[test]
    fn link_failure_releases_the_partial_program() {
        let gl = RecordingApi::new();
        gl.state.borrow_mut().fail_link = Some("varying mismatch".into());
        let mut shader = parsed_program();
        let err = shader.initialize(&gl).unwrap_err();
        assert!(matches!(err, Error::ShaderLink { .. }));
        let state = gl.state.borrow();
        assert_eq!(state.deleted_programs.len(), 1);
        assert_eq!(state.deleted_shaders.len(), 2);
    }

    #[test]
    fn redeclared_name_shares_one_entry_across_stages() {
        let mut shader = ShaderProgram::<RecordingApi>::new();
        shader
            .set_source(
                "uniform mat4 shared;\n",
                "precision mediump float;\nuniform mat4 shared;\n",
            )
            .unwrap();
        assert_eq!(shader.uniforms().len(), 1);
    }

    #[test]
    fn clear_twice_is_idempotent() {
        let gl = RecordingApi::new();
        let mut shader = parsed_program();
        shader
            .set_attribute_data(&gl, "aPos", layout_binding(OwnerId::next()))
            .unwrap();
        shader.initialize(&gl).unwrap();

        shader.clear(&gl);
        shader.clear(&gl);

        let state = gl.state.borrow();
        assert_eq!(state.deleted_programs.len(), 1);
        assert_eq!(state.deleted_shaders.len(), 2);
        assert_eq!(state.detached_shaders.len(), 2);
        assert!(shader.attributes().is_empty());
    }

    #[test]
    fn clear_on_uninitialized_program_is_safe() {
        let gl = RecordingApi::new();
        let mut shader = parsed_program();
        shader.clear(&gl);
        assert!(gl.state.borrow().deleted_programs.is_empty());
    }

    #[test]
    fn bindings_for_owner_round_trip() {
        let gl = RecordingApi::new();
        let mut shader = parsed_program();
        let drawable = OwnerId::next();
        shader
            .set_attribute_data(&gl, "aPos", layout_binding(drawable))
            .unwrap();
        shader.initialize(&gl).unwrap();

        let bindings = shader.attribute_bindings_for(drawable);
        assert_eq!(bindings.len(), 1);
        assert!(matches!(bindings[0].source, AttributeSource::Layout(_)));
        assert!(shader.attribute_bindings_for(OwnerId::next()).is_empty());
    }
}
