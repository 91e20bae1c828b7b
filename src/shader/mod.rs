//! Shader artifact subsystem: the [`ShaderArtifact`] aggregate, include
//! expansion, compile settings and the collaborator seams it is built on.

pub mod artifact;
pub mod device;
pub mod includes;
pub mod loader;
pub mod settings;

pub use artifact::ShaderArtifact;
pub use device::{ComputeDevice, DeviceId, NativeError, NativeHandle};
pub use includes::IncludeResolver;
pub use loader::ShaderResourceLoader;
pub use settings::{ShaderCompileSettings, SourceLanguage, TargetEnvironment};
