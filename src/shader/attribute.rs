//! The per-shader attribute registry.
//!
//! Maps declared attribute names to lazily resolved GPU locations and the
//! owner-tagged data bound to them. Many drawables can bind data to the
//! same variable name; their entries coexist in one list and are routed
//! back out by [`OwnerId`] at draw time.

use log::warn;

use crate::api::GraphicsApi;
use crate::error::Error;
use crate::shader::binding::{AttributeBinding, AttributeSource, OwnerId, ResolvedBinding};

/// One declared attribute variable.
struct AttributeEntry {
    name: String,
    /// Recorded for diagnostics only; the GPU has its own opinion.
    declared_ty: String,
    /// Resolved at most once, on first bind after the program links.
    location: Option<u32>,
    data: Vec<AttributeBinding>,
}

/// Registry of every `attribute` declaration found in a program's source.
#[derive(Default)]
pub struct AttributeRegistry {
    entries: Vec<AttributeEntry>,
}

impl AttributeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declared attribute with no data yet.
    ///
    /// Re-declaring an existing name (the same variable appearing in both
    /// stages) keeps any accumulated data; the later declaration wins for
    /// bookkeeping.
    pub fn declare(&mut self, ty: &str, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.declared_ty = ty.to_owned();
            return;
        }
        self.entries.push(AttributeEntry {
            name: name.to_owned(),
            declared_ty: ty.to_owned(),
            location: None,
            data: Vec::new(),
        });
    }

    /// The mutable entry declared under `name`, if any.
    fn entry_mut(&mut self, name: &str) -> Option<&mut AttributeEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Whether `name` was declared.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind (or re-bind) one owner's data to a declared attribute.
    ///
    /// An existing binding with the same owner is replaced in place —
    /// one binding per (variable, owner). When `linked` carries a live
    /// program, the entry's location is resolved on first need and a
    /// constant value is uploaded immediately; layout data is described at
    /// draw time instead.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownVariable`] if `name` was never declared;
    /// [`Error::UnresolvedLocation`] if the linker reports no location for
    /// it.
    pub fn set_data<G: GraphicsApi>(
        &mut self,
        linked: Option<(&G, G::Program)>,
        name: &str,
        binding: AttributeBinding,
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
            let location = Self::resolve(entry, gl, program)?;
            // Constants live in global GL state, not the owner's buffer, so
            // they can go out right away.
            if let AttributeSource::Constant(value) = &entry.data[index].source {
                gl.vertex_attrib(location, value.values());
            }
        }

        Ok(())
    }

    /// Resolve locations and upload constants for every entry that has
    /// data; warn about declared-but-unbound entries (legal GLSL, likely an
    /// oversight).
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedLocation`] if a data-bearing entry has no
    /// GPU-side location.
    pub fn initialize<G: GraphicsApi>(&mut self, gl: &G, program: G::Program) -> Result<(), Error> {
        for entry in &mut self.entries {
            if entry.data.is_empty() {
                warn!(
                    "attribute {} {} is declared but has no data bound",
                    entry.declared_ty, entry.name
                );
                continue;
            }
            let location = Self::resolve(entry, gl, program)?;
            for binding in &entry.data {
                if let AttributeSource::Constant(value) = &binding.source {
                    gl.vertex_attrib(location, value.values());
                }
            }
        }
        Ok(())
    }

    fn resolve<G: GraphicsApi>(
        entry: &mut AttributeEntry,
        gl: &G,
        program: G::Program,
    ) -> Result<u32, Error> {
        if let Some(location) = entry.location {
            return Ok(location);
        }
        let Some(location) = gl.attrib_location(program, &entry.name) else {
            return Err(Error::UnresolvedLocation {
                name: entry.name.clone(),
            });
        };
        entry.location = Some(location);
        Ok(location)
    }

    /// The variable name some data owned by `owner` is bound to, if any.
    #[must_use]
    pub fn name_for_owner(&self, owner: OwnerId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.data.iter().any(|b| b.owner == owner))
            .map(|e| e.name.as_str())
    }

    /// Every resolved binding tagged with `owner`, ready to hand to that
    /// owner's draw path. Entries whose location never resolved are
    /// skipped; an empty result is not an error.
    #[must_use]
    pub fn bindings_for_owner(&self, owner: OwnerId) -> Vec<ResolvedBinding> {
        let mut out = Vec::new();
        for entry in &self.entries {
            let Some(location) = entry.location else {
                continue;
            };
            for binding in &entry.data {
                if binding.owner == owner {
                    out.push(ResolvedBinding {
                        location,
                        source: binding.source.clone(),
                    });
                }
            }
        }
        out
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
    use crate::shader::binding::{ConstantValue, VertexLayout};

    fn layout() -> VertexLayout {
        VertexLayout {
            size: 2,
            normalized: false,
            stride: 32,
            offset: 0,
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut registry = AttributeRegistry::new();
        registry.declare("vec2", "aPosition");
        let err = registry
            .set_data::<RecordingApi>(
                None,
                "nonexistent",
                AttributeBinding::layout(OwnerId::next(), layout()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownVariable { name } if name == "nonexistent"));
    }

    #[test]
    fn rebinding_replaces_by_owner() {
        let mut registry = AttributeRegistry::new();
        registry.declare("vec2", "aPosition");
        let owner = OwnerId::next();
        let other = OwnerId::next();

        let first = AttributeBinding::layout(owner, layout());
        let second = AttributeBinding::constant(owner, ConstantValue::new(&[1.0]).unwrap());
        let third = AttributeBinding::layout(other, layout());
        registry
            .set_data::<RecordingApi>(None, "aPosition", first)
            .unwrap();
        registry
            .set_data::<RecordingApi>(None, "aPosition", second.clone())
            .unwrap();
        registry
            .set_data::<RecordingApi>(None, "aPosition", third)
            .unwrap();

        assert_eq!(registry.entries[0].data.len(), 2);
        assert_eq!(registry.entries[0].data[0], second);
    }

    #[test]
    fn location_resolves_once_across_set_calls() {
        let gl = RecordingApi::new();
        let mut registry = AttributeRegistry::new();
        registry.declare("vec2", "aPosition");
        let owner = OwnerId::next();

        registry
            .set_data(
                Some((&gl, 1)),
                "aPosition",
                AttributeBinding::layout(owner, layout()),
            )
            .unwrap();
        registry
            .set_data(
                Some((&gl, 1)),
                "aPosition",
                AttributeBinding::layout(owner, layout()),
            )
            .unwrap();

        assert_eq!(gl.state.borrow().attrib_lookups.len(), 1);
    }

    #[test]
    fn missing_location_with_data_is_an_error() {
        let gl = RecordingApi::new();
        gl.drop_location("aPosition");
        let mut registry = AttributeRegistry::new();
        registry.declare("vec2", "aPosition");
        registry
            .set_data::<RecordingApi>(
                None,
                "aPosition",
                AttributeBinding::layout(OwnerId::next(), layout()),
            )
            .unwrap();

        let err = registry.initialize(&gl, 1).unwrap_err();
        assert!(matches!(err, Error::UnresolvedLocation { name } if name == "aPosition"));
    }

    #[test]
    fn dataless_entry_initializes_without_error() {
        let gl = RecordingApi::new();
        let mut registry = AttributeRegistry::new();
        registry.declare("vec2", "aUnused");
        registry.initialize(&gl, 1).unwrap();
        // Never resolved: nothing to describe at draw time either.
        assert!(gl.state.borrow().attrib_lookups.is_empty());
    }

    #[test]
    fn constants_upload_at_initialize() {
        let gl = RecordingApi::new();
        let mut registry = AttributeRegistry::new();
        registry.declare("vec4", "aColor");
        registry
            .set_data::<RecordingApi>(
                None,
                "aColor",
                AttributeBinding::constant(
                    OwnerId::next(),
                    ConstantValue::new(&[1.0, 0.0, 0.0, 1.0]).unwrap(),
                ),
            )
            .unwrap();

        registry.initialize(&gl, 1).unwrap();
        let state = gl.state.borrow();
        assert_eq!(state.constant_attribs.len(), 1);
        assert_eq!(state.constant_attribs[0].1, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn reverse_lookups_by_owner() {
        let gl = RecordingApi::new();
        let mut registry = AttributeRegistry::new();
        registry.declare("vec2", "aPosition");
        registry.declare("vec2", "aTexture");
        let owner = OwnerId::next();

        registry
            .set_data::<RecordingApi>(None, "aPosition", AttributeBinding::layout(owner, layout()))
            .unwrap();
        registry
            .set_data::<RecordingApi>(None, "aTexture", AttributeBinding::layout(owner, layout()))
            .unwrap();
        registry.initialize(&gl, 1).unwrap();

        assert_eq!(registry.name_for_owner(owner), Some("aPosition"));
        assert_eq!(registry.bindings_for_owner(owner).len(), 2);
        assert!(registry.bindings_for_owner(OwnerId::next()).is_empty());
        assert_eq!(registry.name_for_owner(OwnerId::next()), None);
    }
}
