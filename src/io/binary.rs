//! In-Memory Binary Artifact Stream
//!
//! The engine's own persistence format for shader artifacts: a 4-byte magic,
//! the declared [`FormatVersion`] triple, then the codec's fields in order.
//!
//! Encoding rules:
//!
//! - scalars are little-endian; strings are `u32` length + UTF-8 bytes
//! - nullable nested objects are a single presence byte
//! - field names are dropped (the format is positional), except property
//!   tags before raw blocks, which are stored and verified on read
//! - raw word blocks are memcpy'd in native word order, exactly as the
//!   native compile step consumes them
//!
//! Reads are defensive: truncation, a bad magic, a bad presence byte or a
//! mismatched property tag all surface as [`ShaderError`] rather than
//! producing a half-read artifact.

use crate::errors::{Result, ShaderError};
use crate::io::{ArtifactInput, ArtifactOutput, FormatVersion, VersionTriple};

/// Identifies a Prism shader artifact stream.
pub const STREAM_MAGIC: [u8; 4] = *b"PSHD";

const END_OF_LINE_BYTE: u8 = b'\n';

// ─── Writer ──────────────────────────────────────────────────────────────────

/// [`ArtifactOutput`] writing into an owned byte buffer.
#[derive(Debug)]
pub struct BinaryWriter {
    version: FormatVersion,
    buf: Vec<u8>,
}

impl BinaryWriter {
    /// Start a stream declaring `version`. The header (magic + version) is
    /// written immediately.
    #[must_use]
    pub fn new(version: FormatVersion) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&STREAM_MAGIC);
        buf.extend_from_slice(&version.major.to_le_bytes());
        buf.extend_from_slice(&version.minor.to_le_bytes());
        buf.extend_from_slice(&version.patch.to_le_bytes());
        Self { version, buf }
    }

    /// Finish the stream and take the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_str(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }
}

impl ArtifactOutput for BinaryWriter {
    fn version(&self) -> FormatVersion {
        self.version
    }

    fn write_string(&mut self, _name: &str, value: &str) -> Result<()> {
        self.put_str(value);
        Ok(())
    }

    fn write_u32(&mut self, _name: &str, value: u32) -> Result<()> {
        self.put_u32(value);
        Ok(())
    }

    fn write_i32(&mut self, _name: &str, value: i32) -> Result<()> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_bool(&mut self, _name: &str, value: bool) -> Result<()> {
        self.buf.push(u8::from(value));
        Ok(())
    }

    fn write_version(&mut self, _name: &str, value: VersionTriple) -> Result<()> {
        self.put_u32(value.major);
        self.put_u32(value.minor);
        self.put_u32(value.patch);
        Ok(())
    }

    fn write_string_list(&mut self, _name: &str, values: &[String]) -> Result<()> {
        self.put_u32(values.len() as u32);
        for value in values {
            self.put_str(value);
        }
        Ok(())
    }

    fn write_object_begin(&mut self, _name: &str, present: bool) -> Result<()> {
        self.buf.push(u8::from(present));
        Ok(())
    }

    fn write_object_end(&mut self) -> Result<()> {
        // Positional format, nested objects carry no end marker.
        Ok(())
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        self.put_str(name);
        Ok(())
    }

    fn write_word_block(&mut self, words: &[u32]) -> Result<()> {
        self.buf.extend_from_slice(bytemuck::cast_slice(words));
        Ok(())
    }

    fn write_end_of_line(&mut self) -> Result<()> {
        self.buf.push(END_OF_LINE_BYTE);
        Ok(())
    }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

/// [`ArtifactInput`] reading from a borrowed byte slice.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    version: FormatVersion,
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    /// Open a stream, validating the magic and decoding the declared version.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut reader = Self {
            version: FormatVersion::new(0, 0, 0),
            data,
            pos: 0,
        };
        let magic = reader.take(4, "stream magic")?;
        if magic != STREAM_MAGIC {
            return Err(ShaderError::MalformedStream(format!(
                "bad stream magic {magic:02x?}"
            )));
        }
        reader.version = FormatVersion::new(
            reader.take_u32("format version")?,
            reader.take_u32("format version")?,
            reader.take_u32("format version")?,
        );
        Ok(reader)
    }

    /// Version declared by the stream header.
    ///
    /// Also exposed through [`ArtifactInput::version`]; this inherent form
    /// avoids importing the trait just to inspect a stream.
    #[must_use]
    pub fn declared_version(&self) -> FormatVersion {
        self.version
    }

    fn take(&mut self, count: usize, context: &'static str) -> Result<&'a [u8]> {
        if self.data.len() - self.pos < count {
            return Err(ShaderError::UnexpectedEof(context));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn take_u32(&mut self, context: &'static str) -> Result<u32> {
        let bytes = self.take(4, context)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn take_str(&mut self, context: &'static str) -> Result<String> {
        let len = self.take_u32(context)? as usize;
        let bytes = self.take(len, context)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ShaderError::MalformedStream(format!("invalid UTF-8 in {context}: {e}")))
    }
}

impl ArtifactInput for BinaryReader<'_> {
    fn version(&self) -> FormatVersion {
        self.version
    }

    fn read_string(&mut self, _name: &str) -> Result<String> {
        self.take_str("string field")
    }

    fn read_u32(&mut self, _name: &str) -> Result<u32> {
        self.take_u32("u32 field")
    }

    fn read_i32(&mut self, _name: &str) -> Result<i32> {
        let bytes = self.take(4, "i32 field")?;
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn read_bool(&mut self, _name: &str) -> Result<bool> {
        match self.take(1, "bool field")?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ShaderError::MalformedStream(format!(
                "invalid bool byte {other:#04x}"
            ))),
        }
    }

    fn read_version(&mut self, _name: &str) -> Result<VersionTriple> {
        Ok(VersionTriple::new(
            self.take_u32("version field")?,
            self.take_u32("version field")?,
            self.take_u32("version field")?,
        ))
    }

    fn read_string_list(&mut self, _name: &str) -> Result<Vec<String>> {
        let count = self.take_u32("string list")? as usize;
        let mut values = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            values.push(self.take_str("string list entry")?);
        }
        Ok(values)
    }

    fn read_object_begin(&mut self, _name: &str) -> Result<bool> {
        match self.take(1, "object presence byte")?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ShaderError::MalformedStream(format!(
                "invalid object presence byte {other:#04x}"
            ))),
        }
    }

    fn read_object_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn match_property_name(&mut self, name: &str) -> Result<()> {
        let found = self.take_str("property tag")?;
        if found == name {
            Ok(())
        } else {
            Err(ShaderError::MalformedStream(format!(
                "expected property {name:?}, found {found:?}"
            )))
        }
    }

    fn read_word_block(&mut self, count: usize) -> Result<Vec<u32>> {
        let bytes = self.take(count * std::mem::size_of::<u32>(), "word block")?;
        // The source slice has no alignment guarantee, so copy through bytemuck.
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }

    fn read_end_of_line(&mut self) -> Result<()> {
        match self.take(1, "block terminator")?[0] {
            END_OF_LINE_BYTE => Ok(()),
            other => Err(ShaderError::MalformedStream(format!(
                "expected block terminator, found {other:#04x}"
            ))),
        }
    }
}
