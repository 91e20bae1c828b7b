//! Device Seam
//!
//! The renderer's device objects live outside this crate; shader compilation
//! reaches them through [`ComputeDevice`]. A backend (wgpu, ash, a mock in
//! tests) implements the trait and hands `Arc<dyn ComputeDevice>` values to
//! [`ShaderArtifact::compile`].
//!
//! [`ShaderArtifact::compile`]: crate::shader::ShaderArtifact::compile

use std::fmt;

/// Identifies one target compute device's resource namespace.
///
/// Small non-negative integers assigned by the host's device registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device {}", self.0)
    }
}

/// Opaque native compiled-shader handle, owned by the device that created it.
///
/// Only meaningful to the [`ComputeDevice`] that produced it; this crate
/// stores and returns it without interpreting the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Failure reported by the native shader-module construction call.
#[derive(Debug, Clone)]
pub struct NativeError {
    /// Backend error code (e.g. a `VkResult` value).
    pub code: i32,
    /// Backend-supplied description.
    pub message: String,
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (native error {})", self.message, self.code)
    }
}

/// A target compute device capable of turning SPIR-V bytecode into a native
/// compiled-shader handle.
///
/// Handles are created and destroyed through the same device; the artifact's
/// handle cache keeps the device alive alongside every handle it installed so
/// release always goes through the owning allocator.
pub trait ComputeDevice: Send + Sync {
    /// Identifier distinguishing this device's handle namespace.
    fn device_id(&self) -> DeviceId;

    /// Build a native compiled-shader handle from `bytecode`.
    ///
    /// The slice is read-only for the duration of the call. Backends report
    /// rejection via [`NativeError`]; they must not install partial state on
    /// failure.
    fn create_shader_module(&self, bytecode: &[u32]) -> Result<NativeHandle, NativeError>;

    /// Release a handle previously returned by
    /// [`create_shader_module`](ComputeDevice::create_shader_module).
    ///
    /// Called exactly once per installed handle, when the owning artifact is
    /// dropped.
    fn destroy_shader_module(&self, handle: NativeHandle);
}
