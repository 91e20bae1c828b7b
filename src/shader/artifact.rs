//! Shader Artifact
//!
//! [`ShaderArtifact`] is the unit the rest of the renderer trades in: shader
//! source text, compiled SPIR-V bytecode, the [`ShaderCompileSettings`] the
//! bytecode was (or will be) built with, and one lazily created native handle
//! per target device.
//!
//! # Handle lifecycle
//!
//! [`ShaderArtifact::compile`] builds the native handle for a device on first
//! call and is a no-op afterwards: mutating `bytecode` never recompiles an
//! existing handle; replace the artifact instead. Handles are released
//! through their owning device when the artifact is dropped.
//!
//! # Persistence
//!
//! `read` / `write` implement the versioned artifact stream format: the
//! source text, the nullable `hints` settings object (streams ≥ 0.1.3), and
//! the SPIR-V word block prefixed with its word count and `SPIRV` property
//! tag. Reader and writer share the same version gates, so a round-trip at a
//! fixed declared version is lossless.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::errors::{Result, ShaderError};
use crate::io::{
    read_settings_object, write_settings_object, ArtifactInput, ArtifactOutput, FORMAT_0_1_3,
};
use crate::shader::device::{ComputeDevice, DeviceId, NativeHandle};
use crate::shader::settings::ShaderCompileSettings;

/// A shader program artifact: source, bytecode, compile settings and the
/// per-device compiled handles built from it.
///
/// `settings` may be shared by several artifacts; it is immutable once
/// attached.
#[derive(Default)]
pub struct ShaderArtifact {
    /// Shader-language source, possibly still containing include directives.
    pub source: Option<String>,
    /// Compiled SPIR-V words. Empty until compiled or loaded; required
    /// before any device handle can be built.
    pub bytecode: Vec<u32>,
    /// Settings the bytecode was compiled with.
    pub settings: Option<Arc<ShaderCompileSettings>>,
    handles: CompiledHandleCache,
}

impl ShaderArtifact {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact from source text awaiting compilation.
    #[must_use]
    pub fn from_source(source: String, settings: Option<Arc<ShaderCompileSettings>>) -> Self {
        Self {
            source: Some(source),
            settings,
            ..Self::default()
        }
    }

    /// Artifact from precompiled bytecode.
    #[must_use]
    pub fn from_bytecode(bytecode: Vec<u32>) -> Self {
        Self {
            bytecode,
            ..Self::default()
        }
    }

    /// Artifact carrying both its source and the bytecode compiled from it.
    #[must_use]
    pub fn from_parts(source: String, bytecode: Vec<u32>) -> Self {
        Self {
            source: Some(source),
            bytecode,
            ..Self::default()
        }
    }

    /// Deserialize an artifact from `input`.
    ///
    /// Streams older than 0.1.3 carry no settings object; the artifact comes
    /// back with `settings: None`.
    pub fn read(input: &mut dyn ArtifactInput) -> Result<Self> {
        let source = input.read_string("Source")?;

        let settings = if input.version() >= FORMAT_0_1_3 {
            read_settings_object(input, "hints")?.map(Arc::new)
        } else {
            None
        };

        let word_count = input.read_u32("SPIRVSize")? as usize;
        input.match_property_name("SPIRV")?;
        let bytecode = input.read_word_block(word_count)?;
        input.read_end_of_line()?;

        Ok(Self {
            source: (!source.is_empty()).then_some(source),
            bytecode,
            settings,
            handles: CompiledHandleCache::default(),
        })
    }

    /// Serialize the artifact to `output` at its declared version.
    pub fn write(&self, output: &mut dyn ArtifactOutput) -> Result<()> {
        output.write_string("Source", self.source.as_deref().unwrap_or(""))?;

        if output.version() >= FORMAT_0_1_3 {
            write_settings_object(output, "hints", self.settings.as_deref())?;
        }

        output.write_u32("SPIRVSize", self.bytecode.len() as u32)?;
        output.write_property_name("SPIRV")?;
        output.write_word_block(&self.bytecode)?;
        output.write_end_of_line()
    }

    /// Build the native compiled handle for `device`, if not already built.
    ///
    /// Idempotent per device: once a handle exists the call returns without
    /// touching `bytecode`. Concurrent calls for the same device install
    /// exactly one handle; calls for different devices do not contend.
    ///
    /// On failure no handle is installed and the call may be retried.
    pub fn compile(&self, device: &Arc<dyn ComputeDevice>) -> Result<()> {
        self.handles.compile(&self.bytecode, device)
    }

    /// Whether a compiled handle exists for `device`.
    #[must_use]
    pub fn has_handle(&self, device: DeviceId) -> bool {
        self.handles.handle(device).is_some()
    }

    /// The compiled handle for `device`, if one has been built.
    #[must_use]
    pub fn handle(&self, device: DeviceId) -> Option<NativeHandle> {
        self.handles.handle(device)
    }

    /// Number of devices with an installed handle.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.installed_count()
    }
}

impl fmt::Debug for ShaderArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderArtifact")
            .field("source", &self.source.as_ref().map(String::len))
            .field("bytecode_words", &self.bytecode.len())
            .field("settings", &self.settings)
            .field("handles", &self.handles.installed_count())
            .finish()
    }
}

// ─── Compiled Handle Cache ───────────────────────────────────────────────────

struct InstalledHandle {
    handle: NativeHandle,
    /// Back-reference to the creating device; release must go through the
    /// same allocator.
    device: Arc<dyn ComputeDevice>,
}

#[derive(Default)]
struct DeviceSlot {
    installed: Mutex<Option<InstalledHandle>>,
}

/// Sparse per-device store of native compiled handles.
///
/// The outer map guard is held only to find or create a device's slot; the
/// native construction call runs under the slot's own lock, so first-compile
/// is linearizable per device while distinct devices proceed in parallel.
#[derive(Default)]
struct CompiledHandleCache {
    slots: Mutex<FxHashMap<DeviceId, Arc<DeviceSlot>>>,
}

impl CompiledHandleCache {
    fn compile(&self, bytecode: &[u32], device: &Arc<dyn ComputeDevice>) -> Result<()> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(device.device_id()).or_default())
        };

        let mut installed = slot.installed.lock();
        if installed.is_some() {
            return Ok(());
        }
        if bytecode.is_empty() {
            return Err(ShaderError::MissingBytecode);
        }

        let handle = device.create_shader_module(bytecode)?;
        log::debug!(
            "created shader module {handle:?} on {} ({} words)",
            device.device_id(),
            bytecode.len()
        );
        *installed = Some(InstalledHandle {
            handle,
            device: Arc::clone(device),
        });
        Ok(())
    }

    fn handle(&self, device: DeviceId) -> Option<NativeHandle> {
        let slot = Arc::clone(self.slots.lock().get(&device)?);
        let installed = slot.installed.lock();
        installed.as_ref().map(|i| i.handle)
    }

    fn installed_count(&self) -> usize {
        let slots: Vec<_> = self.slots.lock().values().cloned().collect();
        slots
            .iter()
            .filter(|slot| slot.installed.lock().is_some())
            .count()
    }
}

impl Drop for CompiledHandleCache {
    fn drop(&mut self) {
        let slots = std::mem::take(self.slots.get_mut());
        for (device_id, slot) in slots {
            if let Some(installed) = slot.installed.lock().take() {
                log::debug!(
                    "destroying shader module {:?} on {device_id}",
                    installed.handle
                );
                installed.device.destroy_shader_module(installed.handle);
            }
        }
    }
}
