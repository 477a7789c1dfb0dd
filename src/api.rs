//! The graphics device surface the renderer draws against.
//!
//! The scene core never talks to OpenGL directly; it emits calls through
//! [`GraphicsApi`], a WebGL-shaped trait narrowed to exactly the entry
//! points the binding system and the drawables need. The `glow`-backed
//! implementation lives in [`crate::glow_api`]; tests substitute an
//! instrumented fake.

use std::fmt;

use crate::error::Error;

/// The two programmable pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Per-vertex stage.
    Vertex,
    /// Per-fragment stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// An immediate-mode, WebGL-style graphics device.
///
/// Implementations are cheap handles (`Clone` is expected to be a
/// reference-count bump) to a context that must be current on the calling
/// thread. All state mutations happen on that single thread; the renderer
/// is run-to-completion per frame and holds no locks.
///
/// Handle types are associated so registries and drawables stay
/// backend-agnostic: locations resolved from one implementation are only
/// ever fed back into the same implementation.
pub trait GraphicsApi: Clone {
    /// Compiled shader-stage object.
    type Shader: Copy;
    /// Linked program object.
    type Program: Copy;
    /// Vertex buffer object.
    type Buffer: Copy;
    /// 2D texture object.
    type Texture: Copy + PartialEq;
    /// Resolved uniform location.
    type UniformLocation: Clone;

    /// Create an empty shader object for `stage`.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if the device refuses to allocate one.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, Error>;
    /// Replace the shader object's source text.
    fn shader_source(&self, shader: Self::Shader, source: &str);
    /// Compile the shader object's current source.
    fn compile_shader(&self, shader: Self::Shader);
    /// Whether the last compile succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    /// Driver diagnostics for the last compile.
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Create an empty program object.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if the device refuses to allocate one.
    fn create_program(&self) -> Result<Self::Program, Error>;
    /// Attach a compiled stage to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Detach a stage from a program.
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Link the program from its attached stages.
    fn link_program(&self, program: Self::Program);
    /// Whether the last link succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;
    /// Driver diagnostics for the last link.
    fn program_info_log(&self, program: Self::Program) -> String;
    /// Bind a program for drawing and uniform upload (`None` unbinds).
    fn use_program(&self, program: Option<Self::Program>);
    /// Delete a program object.
    fn delete_program(&self, program: Self::Program);

    /// Location of a named vertex attribute, `None` if the linker dropped it.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    /// Location of a named uniform, `None` if the linker dropped it.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Create a buffer object.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if the device refuses to allocate one.
    fn create_buffer(&self) -> Result<Self::Buffer, Error>;
    /// Bind (or with `None`, unbind) the array buffer target.
    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>);
    /// Upload the full contents of the bound array buffer (static-draw usage).
    fn array_buffer_data(&self, data: &[u8]);

    /// Enable the vertex attribute array at `location`.
    fn enable_vertex_attrib_array(&self, location: u32);
    /// Disable the vertex attribute array at `location`.
    fn disable_vertex_attrib_array(&self, location: u32);
    /// Describe how float data for `location` is laid out in the bound buffer.
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    /// Upload a constant (non-buffer-backed) attribute value of 1-4 floats.
    fn vertex_attrib(&self, location: u32, values: &[f32]);

    /// Upload a 1-4 component float vector uniform.
    fn uniform_vec(&self, location: &Self::UniformLocation, values: &[f32]);
    /// Upload a column-major 3×3 matrix uniform.
    fn uniform_matrix3(&self, location: &Self::UniformLocation, values: &[f32; 9]);
    /// Upload a column-major 4×4 matrix uniform.
    fn uniform_matrix4(&self, location: &Self::UniformLocation, values: &[f32; 16]);

    /// Create a texture object.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if the device refuses to allocate one.
    fn create_texture(&self) -> Result<Self::Texture, Error>;
    /// Delete a texture object.
    fn delete_texture(&self, texture: Self::Texture);
    /// Select the active texture unit for subsequent binds.
    fn active_texture_unit(&self, unit: u32);
    /// Bind (or with `None`, unbind) a 2D texture on the active unit.
    fn bind_texture_2d(&self, texture: Option<Self::Texture>);
    /// Upload RGBA8 pixels to the bound 2D texture.
    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]);
    /// Generate a mipmap chain for the bound 2D texture.
    fn generate_mipmaps(&self);
    /// Linear filtering + clamp-to-edge wrap for the bound 2D texture.
    ///
    /// The fallback parameter set for non-power-of-two images, which cannot
    /// be mipmapped under WebGL-1 rules.
    fn set_linear_clamp_params(&self);

    /// Issue one triangle-strip draw call over `count` vertices.
    fn draw_triangle_strip(&self, first: i32, count: i32);
}
