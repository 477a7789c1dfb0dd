//! The per-shader uniform registry.
//!
//! Same shape as [`AttributeRegistry`](crate::shader::AttributeRegistry)
//! but for `uniform` declarations: locations resolve lazily and exactly
//! once, and payloads upload through the GL call selected by their shape.
//! Uploads require the owning program to be bound, so every GPU-touching
//! path here starts with `use_program`.

use log::warn;

use crate::api::GraphicsApi;
use crate::error::Error;
use crate::shader::binding::{OwnerId, UniformBinding};

/// One declared uniform variable.
struct UniformEntry<G: GraphicsApi> {
    name: String,
    /// Recorded for diagnostics only.
    declared_ty: String,
    /// Resolved at most once, on first bind after the program links.
    location: Option<G::UniformLocation>,
    data: Vec<UniformBinding>,
}

/// Registry of every `uniform` declaration found in a program's source.
pub struct UniformRegistry<G: GraphicsApi> {
    entries: Vec<UniformEntry<G>>,
}

impl<G: GraphicsApi> Default for UniformRegistry<G> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<G: GraphicsApi> UniformRegistry<G> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declared uniform with no data yet.
    ///
    /// Re-declaring an existing name (the same variable appearing in both
    /// stages) keeps any accumulated data; the later declaration wins for
    /// bookkeeping.
    pub fn declare(&mut self, ty: &str, name: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.declared_ty = ty.to_owned();
            return;
        }
        self.entries.push(UniformEntry {
            name: name.to_owned(),
            declared_ty: ty.to_owned(),
            location: None,
            data: Vec::new(),
        });
    }

    /// Whether `name` was declared.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of declared uniforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no uniforms were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind (or re-bind) one owner's payload to a declared uniform.
    ///
    /// An existing binding with the same owner is replaced in place — one
    /// binding per (variable, owner). When `linked` carries a live program,
    /// the payload is uploaded immediately (resolving the location on
    /// first need); otherwise it is queued for
    /// [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// [`Error::UnknownVariable`] if `name` was never declared;
    /// [`Error::UnresolvedLocation`] if the linker reports no location for
    /// it.
    pub fn set_data(
        &mut self,
        linked: Option<(&G, G::Program)>,
        name: &str,
        binding: UniformBinding,
    ) -> Result<(), Error> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) else {
            return Err(Error::UnknownVariable {
                name: name.to_owned(),
            });
        };

        let index = match entry.data.iter().position(|b| b.owner == binding.owner) {
            Some(pos) => {
                entry.data[pos] = binding;
                pos
            }
            None => {
                entry.data.push(binding);
                entry.data.len() - 1
            }
        };

        if let Some((gl, program)) = linked {
            gl.use_program(Some(program));
            let location = Self::resolve(entry, gl, program)?;
            entry.data[index].payload.upload(gl, &location);
        }

        Ok(())
    }

    /// Resolve locations and upload every queued payload; warn about
    /// declared-but-unbound entries (legal GLSL, likely an oversight).
    ///
    /// When several owners bound data to the same variable, every payload
    /// uploads in binding order and the last one is what the GPU keeps.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedLocation`] if a data-bearing entry has no
    /// GPU-side location.
    pub fn initialize(&mut self, gl: &G, program: G::Program) -> Result<(), Error> {
        gl.use_program(Some(program));
        for entry in &mut self.entries {
            if entry.data.is_empty() {
                warn!(
                    "uniform {} {} is declared but has no data bound",
                    entry.declared_ty, entry.name
                );
                continue;
            }
            let location = Self::resolve(entry, gl, program)?;
            for binding in &entry.data {
                binding.payload.upload(gl, &location);
            }
        }
        Ok(())
    }

    fn resolve(
        entry: &mut UniformEntry<G>,
        gl: &G,
        program: G::Program,
    ) -> Result<G::UniformLocation, Error> {
        if let Some(location) = &entry.location {
            return Ok(location.clone());
        }
        let Some(location) = gl.uniform_location(program, &entry.name) else {
            return Err(Error::UnresolvedLocation {
                name: entry.name.clone(),
            });
        };
        entry.location = Some(location.clone());
        Ok(location)
    }

    /// The variable name some payload owned by `owner` is bound to, if any.
    #[must_use]
    pub fn name_for_owner(&self, owner: OwnerId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.data.iter().any(|b| b.owner == owner))
            .map(|e| e.name.as_str())
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingApi;
    use crate::shader::binding::UniformPayload;

    fn mat4_binding(owner: OwnerId) -> UniformBinding {
        UniformBinding::new(owner, UniformPayload::Mat4([1.0; 16]))
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut registry = UniformRegistry::<RecordingApi>::new();
        registry.declare("mat4", "camera");
        let err = registry
            .set_data(None, "nonexistent", mat4_binding(OwnerId::next()))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownVariable { name } if name == "nonexistent"));
    }

    #[test]
    fn location_resolves_once_across_set_calls() {
        let gl = RecordingApi::new();
        let mut registry = UniformRegistry::new();
        registry.declare("mat4", "camera");
        let owner = OwnerId::next();

        registry
            .set_data(Some((&gl, 7)), "camera", mat4_binding(owner))
            .unwrap();
        registry
            .set_data(Some((&gl, 7)), "camera", mat4_binding(owner))
            .unwrap();

        let state = gl.state.borrow();
        assert_eq!(state.uniform_lookups.len(), 1);
        assert_eq!(state.uniform_uploads.len(), 2);
    }

    #[test]
    fn uploads_bind_the_program_first() {
        let gl = RecordingApi::new();
        let mut registry = UniformRegistry::new();
        registry.declare("float", "alpha");
        registry
            .set_data(
                Some((&gl, 7)),
                "alpha",
                UniformBinding::new(OwnerId::next(), UniformPayload::Scalar(1.0)),
            )
            .unwrap();
        assert_eq!(gl.state.borrow().used_programs, vec![Some(7)]);
    }

    #[test]
    fn queued_data_uploads_at_initialize() {
        let gl = RecordingApi::new();
        let mut registry = UniformRegistry::new();
        registry.declare("mat4", "camera");
        registry.declare("float", "alpha");
        registry
            .set_data(None, "camera", mat4_binding(OwnerId::next()))
            .unwrap();
        registry
            .set_data(
                None,
                "alpha",
                UniformBinding::new(OwnerId::next(), UniformPayload::Scalar(0.5)),
            )
            .unwrap();

        registry.initialize(&gl, 7).unwrap();

        let state = gl.state.borrow();
        assert_eq!(state.uniform_uploads.len(), 2);
        assert_eq!(state.uniform_uploads[1].1, vec![0.5]);
    }

    #[test]
    fn missing_location_with_data_is_an_error() {
        let gl = RecordingApi::new();
        gl.drop_location("camera");
        let mut registry = UniformRegistry::new();
        registry.declare("mat4", "camera");
        registry
            .set_data(None, "camera", mat4_binding(OwnerId::next()))
            .unwrap();
        let err = registry.initialize(&gl, 7).unwrap_err();
        assert!(matches!(err, Error::UnresolvedLocation { name } if name == "camera"));
    }

    #[test]
    fn dataless_entry_initializes_without_error() {
        let gl = RecordingApi::new();
        let mut registry = UniformRegistry::new();
        registry.declare("sampler2D", "uSampler");
        registry.initialize(&gl, 7).unwrap();
        assert!(gl.state.borrow().uniform_lookups.is_empty());
    }

    #[test]
    fn rebinding_replaces_by_owner() {
        let mut registry = UniformRegistry::<RecordingApi>::new();
        registry.declare("mat4", "camera");
        let owner = OwnerId::next();
        registry.set_data(None, "camera", mat4_binding(owner)).unwrap();
        registry
            .set_data(
                None,
                "camera",
                UniformBinding::new(owner, UniformPayload::Mat4([2.0; 16])),
            )
            .unwrap();
        assert_eq!(registry.entries[0].data.len(), 1);
        assert_eq!(
            registry.entries[0].data[0].payload,
            UniformPayload::Mat4([2.0; 16])
        );
    }

    #[test]
    fn name_for_owner_scans_payloads() {
        let mut registry = UniformRegistry::<RecordingApi>::new();
        registry.declare("mat4", "camera");
        registry.declare("mat4", "modelview");
        let camera_owner = OwnerId::next();
        registry
            .set_data(None, "modelview", mat4_binding(OwnerId::next()))
            .unwrap();
        registry
            .set_data(None, "camera", mat4_binding(camera_owner))
            .unwrap();

        assert_eq!(registry.name_for_owner(camera_owner), Some("camera"));
        assert_eq!(registry.name_for_owner(OwnerId::next()), None);
    }
}
