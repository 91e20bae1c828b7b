//! Artifact Stream Surface
//!
//! Shader artifacts are persisted through a reflective, field-by-field stream
//! interface: the codec walks its fields in a fixed order, handing each one to
//! an [`ArtifactOutput`] (writing) or [`ArtifactInput`] (reading) by name.
//! Both sides carry a declared [`FormatVersion`]; fields introduced at a given
//! format revision are gated on the shared constants [`FORMAT_0_1_3`] and
//! [`FORMAT_0_1_4`] so the reader and writer can never disagree about which
//! fields are present.
//!
//! [`binary`] provides the in-memory binary implementation used by the engine;
//! hosts with their own persistence layer implement the two traits instead.

pub mod binary;

use crate::errors::Result;
use crate::shader::settings::ShaderCompileSettings;

/// Version of the artifact exchange format a stream declares.
///
/// Ordered so gates read as `input.version() >= FORMAT_0_1_4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FormatVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// First format revision carrying the nested compile-settings object.
pub const FORMAT_0_1_3: FormatVersion = FormatVersion::new(0, 1, 3);

/// First format revision carrying the preprocessor define list.
pub const FORMAT_0_1_4: FormatVersion = FormatVersion::new(0, 1, 4);

/// Latest format revision this crate writes by default.
pub const FORMAT_CURRENT: FormatVersion = FORMAT_0_1_4;

/// A `major.minor.patch` triple stored as a scalar field group.
///
/// Used for the target-environment and client-input versions inside
/// [`ShaderCompileSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTriple {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTriple {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

/// Writing side of the artifact stream.
///
/// Field names identify the value for self-describing stream formats; binary
/// implementations are free to drop them and rely on field order alone.
pub trait ArtifactOutput {
    /// Format version this stream declares. Gated fields are written only
    /// when this is at or above their gate.
    fn version(&self) -> FormatVersion;

    fn write_string(&mut self, name: &str, value: &str) -> Result<()>;
    fn write_u32(&mut self, name: &str, value: u32) -> Result<()>;
    fn write_i32(&mut self, name: &str, value: i32) -> Result<()>;
    fn write_bool(&mut self, name: &str, value: bool) -> Result<()>;
    fn write_version(&mut self, name: &str, value: VersionTriple) -> Result<()>;
    fn write_string_list(&mut self, name: &str, values: &[String]) -> Result<()>;

    /// Open a nullable nested object field. `present = false` records an
    /// explicit null and must not be followed by [`write_object_end`].
    ///
    /// [`write_object_end`]: ArtifactOutput::write_object_end
    fn write_object_begin(&mut self, name: &str, present: bool) -> Result<()>;
    fn write_object_end(&mut self) -> Result<()>;

    /// Tag the next raw block with a property name.
    fn write_property_name(&mut self, name: &str) -> Result<()>;

    /// Write a contiguous block of 32-bit words.
    fn write_word_block(&mut self, words: &[u32]) -> Result<()>;

    /// Terminate a raw block so textual stream formats stay line-oriented.
    fn write_end_of_line(&mut self) -> Result<()>;
}

/// Reading side of the artifact stream. Mirrors [`ArtifactOutput`]
/// field-for-field; a reader and writer at the same declared version walk
/// the same field sequence.
pub trait ArtifactInput {
    /// Format version the stream declares. The codec trusts this: gated
    /// fields are read exactly when the writer would have written them.
    fn version(&self) -> FormatVersion;

    fn read_string(&mut self, name: &str) -> Result<String>;
    fn read_u32(&mut self, name: &str) -> Result<u32>;
    fn read_i32(&mut self, name: &str) -> Result<i32>;
    fn read_bool(&mut self, name: &str) -> Result<bool>;
    fn read_version(&mut self, name: &str) -> Result<VersionTriple>;
    fn read_string_list(&mut self, name: &str) -> Result<Vec<String>>;

    /// Open a nullable nested object field. Returns `false` for an explicit
    /// null, in which case [`read_object_end`] must not be called.
    ///
    /// [`read_object_end`]: ArtifactInput::read_object_end
    fn read_object_begin(&mut self, name: &str) -> Result<bool>;
    fn read_object_end(&mut self) -> Result<()>;

    /// Consume the property tag preceding a raw block, verifying it where
    /// the stream format records it.
    fn match_property_name(&mut self, name: &str) -> Result<()>;

    /// Read a contiguous block of `count` 32-bit words.
    fn read_word_block(&mut self, count: usize) -> Result<Vec<u32>>;

    /// Consume the terminator written by [`ArtifactOutput::write_end_of_line`].
    fn read_end_of_line(&mut self) -> Result<()>;
}

/// Write a nullable settings object as the nested `hints` field.
///
/// Shared by the artifact codec and tests so null encoding stays in one place.
pub fn write_settings_object(
    output: &mut dyn ArtifactOutput,
    name: &str,
    settings: Option<&ShaderCompileSettings>,
) -> Result<()> {
    match settings {
        Some(settings) => {
            output.write_object_begin(name, true)?;
            settings.write(output)?;
            output.write_object_end()
        }
        None => output.write_object_begin(name, false),
    }
}

/// Read a nullable settings object written by [`write_settings_object`].
pub fn read_settings_object(
    input: &mut dyn ArtifactInput,
    name: &str,
) -> Result<Option<ShaderCompileSettings>> {
    if input.read_object_begin(name)? {
        let settings = ShaderCompileSettings::read(input)?;
        input.read_object_end()?;
        Ok(Some(settings))
    } else {
        Ok(None)
    }
}
