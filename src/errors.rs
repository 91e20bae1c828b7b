//! Error Types
//!
//! The error type [`ShaderError`] covers the failure modes of this crate:
//!
//! - Native shader-module construction failures
//! - Malformed or truncated artifact streams
//!
//! Include expansion never fails; a missing include file is recorded as an
//! inline marker in the expanded source instead (see
//! [`crate::shader::includes`]).
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, ShaderError>`.

use thiserror::Error;

/// The error type for shader artifact operations.
#[derive(Error, Debug)]
pub enum ShaderError {
    // ========================================================================
    // Native Compilation Errors
    // ========================================================================
    /// The device rejected the bytecode or failed to allocate the module.
    ///
    /// Carries the driver's message and native error code. No handle is
    /// installed; `compile` may be retried for the same device.
    #[error("Failed to create shader module: {message} (native error {code})")]
    NativeCompile {
        /// Driver-supplied description of the failure.
        message: String,
        /// Native error code as reported by the device backend.
        code: i32,
    },

    /// `compile` was called on an artifact with no bytecode.
    #[error("Shader artifact has no bytecode to compile")]
    MissingBytecode,

    // ========================================================================
    // Artifact Stream Errors
    // ========================================================================
    /// The stream contents do not match the artifact format.
    #[error("Malformed artifact stream: {0}")]
    MalformedStream(String),

    /// The stream ended before the named field could be read.
    #[error("Unexpected end of artifact stream while reading {0}")]
    UnexpectedEof(&'static str),
}

impl From<crate::shader::device::NativeError> for ShaderError {
    fn from(err: crate::shader::device::NativeError) -> Self {
        ShaderError::NativeCompile {
            message: err.message,
            code: err.code,
        }
    }
}

/// Alias for `Result<T, ShaderError>`.
pub type Result<T> = std::result::Result<T, ShaderError>;
