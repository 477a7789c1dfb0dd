//! The [`glow`]-backed [`GraphicsApi`] implementation.
//!
//! A thin, safe-at-the-call-site wrapper over a shared [`glow::Context`].
//! Every method issues raw GL calls, so the safety contract lives on
//! [`GlowApi::new`]: the context must be current on the calling thread and
//! stay current for the lifetime of the handle.
//!
//! [`glow`]: https://docs.rs/glow

use std::sync::Arc;

use glow::{HasContext, PixelUnpackData};

use crate::api::{GraphicsApi, ShaderStage};
use crate::error::Error;

/// GL internal format for RGBA8 textures, pre-cast to the `i32` that
/// `tex_image_2d` expects.
#[expect(clippy::cast_possible_wrap)]
const RGBA8_INTERNAL_FORMAT: i32 = glow::RGBA8 as i32;

/// Convert a `u32` to `i32` for GL API calls.
///
/// # Panics
///
/// Panics if `value > i32::MAX`. In practice, this is unreachable for
/// normal image sizes.
fn gl_size(value: u32) -> i32 {
    i32::try_from(value).expect("dimension exceeds i32::MAX")
}

/// A [`GraphicsApi`] over an OpenGL (or WebGL/GLES) context via glow.
///
/// Cloning bumps the [`Arc`]; all clones refer to the same context.
#[derive(Clone)]
pub struct GlowApi {
    gl: Arc<glow::Context>,
}

impl GlowApi {
    /// Wrap a glow context.
    ///
    /// # Safety
    ///
    /// The context must be current and valid on the calling thread, and
    /// must remain so while this handle (or any clone of it) is used.
    #[must_use]
    pub unsafe fn new(gl: Arc<glow::Context>) -> Self {
        Self { gl }
    }

    /// The wrapped context, for host code that needs direct access
    /// (viewport, clear, blend state).
    #[must_use]
    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }
}

impl GraphicsApi for GlowApi {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, Error> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }.map_err(Error::Resource)
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) };
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) };
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) };
    }

    fn create_program(&self) -> Result<Self::Program, Error> {
        unsafe { self.gl.create_program() }.map_err(Error::Resource)
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) };
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) };
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) };
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) };
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) };
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, Error> {
        unsafe { self.gl.create_buffer() }.map_err(Error::Resource)
    }

    fn bind_array_buffer(&self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) };
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) };
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(location) };
    }

    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(location, size, glow::FLOAT, normalized, stride, offset);
        }
    }

    fn vertex_attrib(&self, location: u32, values: &[f32]) {
        unsafe {
            match *values {
                [x] => self.gl.vertex_attrib_1_f32(location, x),
                [x, y] => self.gl.vertex_attrib_2_f32(location, x, y),
                [x, y, z] => self.gl.vertex_attrib_3_f32(location, x, y, z),
                [x, y, z, w] => self.gl.vertex_attrib_4_f32(location, x, y, z, w),
                // Registries validate component counts before upload.
                _ => {}
            }
        }
    }

    fn uniform_vec(&self, location: &Self::UniformLocation, values: &[f32]) {
        let loc = Some(location);
        unsafe {
            match *values {
                [x] => self.gl.uniform_1_f32(loc, x),
                [x, y] => self.gl.uniform_2_f32(loc, x, y),
                [x, y, z] => self.gl.uniform_3_f32(loc, x, y, z),
                [x, y, z, w] => self.gl.uniform_4_f32(loc, x, y, z, w),
                // Registries validate payload shapes before upload.
                _ => {}
            }
        }
    }

    fn uniform_matrix3(&self, location: &Self::UniformLocation, values: &[f32; 9]) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(location), false, values);
        }
    }

    fn uniform_matrix4(&self, location: &Self::UniformLocation, values: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, values);
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, Error> {
        unsafe { self.gl.create_texture() }.map_err(Error::Resource)
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) };
    }

    fn active_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture_2d(&self, texture: Option<Self::Texture>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) };
    }

    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                RGBA8_INTERNAL_FORMAT,
                gl_size(width),
                gl_size(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn generate_mipmaps(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) };
    }

    fn set_linear_clamp_params(&self) {
        // GL constant values are small enough that the cast is always safe.
        #[expect(clippy::cast_possible_wrap)]
        unsafe {
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }
    }

    fn draw_triangle_strip(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLE_STRIP, first, count) };
    }
}
