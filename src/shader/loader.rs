//! Resource Loader Seam
//!
//! Include expansion fetches referenced files through the host's resource
//! pipeline rather than touching the filesystem itself. Search paths, virtual
//! filesystems and caching are the loader implementation's concern.

use std::sync::Arc;

use crate::shader::ShaderArtifact;

/// Supplies shader artifacts for `#include` / `#pragma include` directives.
///
/// Returns `None` on any failure (not found, parse error, I/O error); the
/// resolver does not distinguish failure kinds and records the miss as an
/// inline marker in the expanded source.
pub trait ShaderResourceLoader {
    /// Load the artifact named by an include directive.
    ///
    /// The returned artifact's `source` is spliced into the including file.
    /// It may still contain directives of its own; the resolver expands them
    /// in place.
    fn load_shader_resource(&self, filename: &str) -> Option<Arc<ShaderArtifact>>;
}

/// Loader over a fixed in-memory name → source table.
///
/// Enough for embedded shader chunk libraries and for tests; real asset
/// pipelines implement [`ShaderResourceLoader`] directly.
#[derive(Debug, Default)]
pub struct StaticSourceLoader {
    entries: Vec<(String, Arc<ShaderArtifact>)>,
}

impl StaticSourceLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `filename`, replacing any previous entry.
    pub fn insert(&mut self, filename: impl Into<String>, source: impl Into<String>) {
        let filename = filename.into();
        let artifact = Arc::new(ShaderArtifact::from_source(source.into(), None));
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == filename) {
            entry.1 = artifact;
        } else {
            self.entries.push((filename, artifact));
        }
    }
}

impl ShaderResourceLoader for StaticSourceLoader {
    fn load_shader_resource(&self, filename: &str) -> Option<Arc<ShaderArtifact>> {
        self.entries
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, artifact)| Arc::clone(artifact))
    }
}
