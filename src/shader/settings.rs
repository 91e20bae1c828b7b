//! Shader Compile Settings
//!
//! A small value record describing how an artifact's source is (or was)
//! compiled to SPIR-V: target environment, source language, GLSL profile
//! version and preprocessor defines. Settings are attached to artifacts as
//! `Arc<ShaderCompileSettings>`; one record may be shared by many artifacts
//! and is immutable once attached.
//!
//! The codec here is the `hints` half of the artifact stream format. Field
//! order is fixed; the define list only exists in streams at or above
//! [`FORMAT_0_1_4`].

use crate::errors::{Result, ShaderError};
use crate::io::{ArtifactInput, ArtifactOutput, FORMAT_0_1_4, VersionTriple};

/// Shading language the artifact's source text is written in.
///
/// Stored in the stream as its underlying integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum SourceLanguage {
    #[default]
    Glsl = 0,
    Hlsl = 1,
}

impl SourceLanguage {
    fn from_stream(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Glsl),
            1 => Ok(Self::Hlsl),
            other => Err(ShaderError::MalformedStream(format!(
                "unknown source language {other}"
            ))),
        }
    }
}

/// SPIR-V environment the compiler targets.
///
/// Stored in the stream as its underlying integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum TargetEnvironment {
    #[default]
    SpirV1_0 = 0,
    SpirV1_1 = 1,
    SpirV1_2 = 2,
    SpirV1_3 = 3,
    SpirV1_4 = 4,
    SpirV1_5 = 5,
}

impl TargetEnvironment {
    fn from_stream(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::SpirV1_0),
            1 => Ok(Self::SpirV1_1),
            2 => Ok(Self::SpirV1_2),
            3 => Ok(Self::SpirV1_3),
            4 => Ok(Self::SpirV1_4),
            5 => Ok(Self::SpirV1_5),
            other => Err(ShaderError::MalformedStream(format!(
                "unknown target environment {other}"
            ))),
        }
    }
}

/// Compile settings attached to a [`ShaderArtifact`].
///
/// [`ShaderArtifact`]: crate::shader::ShaderArtifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderCompileSettings {
    /// Vulkan API version the compiled module targets.
    pub vulkan_version: VersionTriple,
    /// Client input semantics version.
    pub client_input_version: VersionTriple,
    /// Language of the source text.
    pub language: SourceLanguage,
    /// GLSL version profile assumed when the source declares none.
    pub default_version: i32,
    /// SPIR-V target environment.
    pub target: TargetEnvironment,
    /// Treat forward-incompatible constructs as errors.
    pub forward_compatible: bool,
    /// Preprocessor defines, in application order. Only carried by streams
    /// at or above [`FORMAT_0_1_4`].
    pub defines: Vec<String>,
}

impl Default for ShaderCompileSettings {
    fn default() -> Self {
        Self {
            vulkan_version: VersionTriple::new(1, 0, 0),
            client_input_version: VersionTriple::new(1, 0, 0),
            language: SourceLanguage::Glsl,
            default_version: 450,
            target: TargetEnvironment::SpirV1_0,
            forward_compatible: false,
            defines: Vec::new(),
        }
    }
}

impl ShaderCompileSettings {
    /// Read the settings record from `input`, honoring its declared version.
    pub fn read(input: &mut dyn ArtifactInput) -> Result<Self> {
        let mut settings = Self {
            vulkan_version: input.read_version("vulkanVersion")?,
            client_input_version: input.read_version("clientInputVersion")?,
            language: SourceLanguage::from_stream(input.read_i32("language")?)?,
            default_version: input.read_i32("defaultVersion")?,
            target: TargetEnvironment::from_stream(input.read_i32("target")?)?,
            forward_compatible: input.read_bool("forwardCompatible")?,
            defines: Vec::new(),
        };

        if input.version() >= FORMAT_0_1_4 {
            settings.defines = input.read_string_list("defines")?;
        }

        Ok(settings)
    }

    /// Write the settings record to `output`, honoring its declared version.
    ///
    /// Pre-[`FORMAT_0_1_4`] streams drop the define list; a matching reader
    /// recovers empty defines.
    pub fn write(&self, output: &mut dyn ArtifactOutput) -> Result<()> {
        output.write_version("vulkanVersion", self.vulkan_version)?;
        output.write_version("clientInputVersion", self.client_input_version)?;
        output.write_i32("language", self.language as i32)?;
        output.write_i32("defaultVersion", self.default_version)?;
        output.write_i32("target", self.target as i32)?;
        output.write_bool("forwardCompatible", self.forward_compatible)?;

        if output.version() >= FORMAT_0_1_4 {
            output.write_string_list("defines", &self.defines)?;
        }

        Ok(())
    }
}
