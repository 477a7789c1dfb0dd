//! The data payloads that can be bound to declared shader variables.
//!
//! A binding associates a declared variable name with one owner's data: a
//! vertex-buffer layout or constant value for attributes, a vector or
//! matrix payload for uniforms. Owners are identified by [`OwnerId`], which
//! is how a scene routes per-object data back out of a shared shader.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;

use crate::api::GraphicsApi;
use crate::error::Error;

/// A stable identity for anything that binds data to a shader: drawables,
/// cameras, the scene itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocate the next process-wide unique id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// How one attribute's floats are packed inside an interleaved per-vertex
/// buffer.
///
/// Immutable once created; the invariant `offset + size * 4 <= stride`
/// must hold for any buffer shared between layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Components per vertex, 1-4.
    pub size: i32,
    /// Whether integer data should be normalized (always false for floats).
    pub normalized: bool,
    /// Bytes from one vertex record to the next.
    pub stride: i32,
    /// Bytes from the start of a record to this attribute's first float.
    pub offset: i32,
}

/// A per-vertex-constant attribute value of 1-4 floats, e.g. a flat color
/// that is not stored in the vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantValue {
    values: Vec<f32>,
}

impl ConstantValue {
    /// A constant attribute value.
    ///
    /// # Errors
    ///
    /// [`Error::IncompatibleUniformLength`] if `values` is empty or longer
    /// than four components.
    pub fn new(values: &[f32]) -> Result<Self, Error> {
        if values.is_empty() || values.len() > 4 {
            return Err(Error::IncompatibleUniformLength { len: values.len() });
        }
        Ok(Self {
            values: values.to_vec(),
        })
    }

    /// The component values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// The two ways attribute data can reach the GPU.
///
/// Exactly one applies per binding; the variants make the exclusivity
/// structural instead of a pair of optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSource {
    /// Sourced from the owner's interleaved vertex buffer.
    Layout(VertexLayout),
    /// A constant value shared by every vertex.
    Constant(ConstantValue),
}

/// One owner's data for one declared attribute variable.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBinding {
    /// Who this data belongs to.
    pub owner: OwnerId,
    /// The data itself.
    pub source: AttributeSource,
}

impl AttributeBinding {
    /// A buffer-layout binding.
    #[must_use]
    pub fn layout(owner: OwnerId, layout: VertexLayout) -> Self {
        Self {
            owner,
            source: AttributeSource::Layout(layout),
        }
    }

    /// A constant-value binding.
    #[must_use]
    pub fn constant(owner: OwnerId, value: ConstantValue) -> Self {
        Self {
            owner,
            source: AttributeSource::Constant(value),
        }
    }
}

/// An attribute binding paired with its resolved GPU location, as handed to
/// a drawable at draw time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding {
    /// The attribute array index reported by the linker.
    pub location: u32,
    /// The data to describe or upload at that location.
    pub source: AttributeSource,
}

/// A uniform payload; the shape selects the GPU upload call.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformPayload {
    /// `uniform float`.
    Scalar(f32),
    /// `uniform vec2`.
    Vec2([f32; 2]),
    /// `uniform vec3`.
    Vec3([f32; 3]),
    /// `uniform vec4`.
    Vec4([f32; 4]),
    /// `uniform mat3`, column-major.
    Mat3([f32; 9]),
    /// `uniform mat4`, column-major.
    Mat4([f32; 16]),
}

impl UniformPayload {
    /// Classify a flat float slice by length.
    ///
    /// # Errors
    ///
    /// [`Error::IncompatibleUniformLength`] for lengths other than 1-4, 9,
    /// or 16.
    pub fn from_slice(values: &[f32]) -> Result<Self, Error> {
        match *values {
            [x] => Ok(Self::Scalar(x)),
            [x, y] => Ok(Self::Vec2([x, y])),
            [x, y, z] => Ok(Self::Vec3([x, y, z])),
            [x, y, z, w] => Ok(Self::Vec4([x, y, z, w])),
            _ => match values.len() {
                9 => {
                    let mut m = [0.0; 9];
                    m.copy_from_slice(values);
                    Ok(Self::Mat3(m))
                }
                16 => {
                    let mut m = [0.0; 16];
                    m.copy_from_slice(values);
                    Ok(Self::Mat4(m))
                }
                len => Err(Error::IncompatibleUniformLength { len }),
            },
        }
    }

    /// Issue the upload call matching this payload's shape.
    pub(crate) fn upload<G: GraphicsApi>(&self, gl: &G, location: &G::UniformLocation) {
        match self {
            Self::Scalar(x) => gl.uniform_vec(location, &[*x]),
            Self::Vec2(v) => gl.uniform_vec(location, v),
            Self::Vec3(v) => gl.uniform_vec(location, v),
            Self::Vec4(v) => gl.uniform_vec(location, v),
            Self::Mat3(m) => gl.uniform_matrix3(location, m),
            Self::Mat4(m) => gl.uniform_matrix4(location, m),
        }
    }
}

impl From<Mat4> for UniformPayload {
    fn from(matrix: Mat4) -> Self {
        Self::Mat4(matrix.to_cols_array())
    }
}

/// One owner's data for one declared uniform variable.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBinding {
    /// Who this data belongs to.
    pub owner: OwnerId,
    /// The data itself.
    pub payload: UniformPayload,
}

impl UniformBinding {
    /// A uniform binding.
    #[must_use]
    pub fn new(owner: OwnerId, payload: UniformPayload) -> Self {
        Self { owner, payload }
    }
}
