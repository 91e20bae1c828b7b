//! Shader artifact management for the Prism renderer.
//!
//! This crate owns the lifecycle of a shader program from source text to a
//! native compiled handle:
//!
//! - [`IncludeResolver`] flattens `#include` / `#pragma include` directives
//!   into a single self-contained compilation unit.
//! - [`ShaderArtifact`] bundles source, SPIR-V bytecode and
//!   [`ShaderCompileSettings`], and reads/writes the versioned artifact
//!   stream format.
//! - Each artifact lazily builds one native handle per target device through
//!   the [`ComputeDevice`] seam and releases it with the artifact.
//!
//! The actual GLSL→SPIR-V compiler, the device objects and the resource
//! loading pipeline are external collaborators reached through traits.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod errors;
pub mod io;
pub mod shader;

pub use errors::{Result, ShaderError};
pub use io::binary::{BinaryReader, BinaryWriter};
pub use io::{ArtifactInput, ArtifactOutput, FormatVersion, VersionTriple};
pub use shader::device::{ComputeDevice, DeviceId, NativeError, NativeHandle};
pub use shader::includes::IncludeResolver;
pub use shader::loader::ShaderResourceLoader;
pub use shader::settings::{ShaderCompileSettings, SourceLanguage, TargetEnvironment};
pub use shader::ShaderArtifact;
