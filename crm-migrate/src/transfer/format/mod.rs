//! Wire formats for bundle entity files
//!
//! A format turns a [`RowStream`] into bytes and back. Only JSON is
//! registered; [`format_for`] is the single place new formats get added.

mod json;

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

pub use json::JsonFormat;

use super::RowStream;
use crate::error::{MigrateError, Result};

/// Serializer/deserializer for a row array
pub trait Format {
    /// Name used in options (`--format`)
    fn name(&self) -> &'static str;

    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Serialize every row of the stream, from the start
    fn write(&self, stream: &mut RowStream, out: &mut dyn Write, pretty: bool) -> Result<()>;

    /// Append every row found in `input` to the stream; returns the row count
    fn read(&self, input: &mut dyn Read, stream: &mut RowStream) -> Result<usize>;

    /// Write the stream to a file, creating parent directories
    ///
    /// Nothing is written for an empty stream. Returns whether a file was
    /// written.
    fn write_file(&self, stream: &mut RowStream, path: &Path, pretty: bool) -> Result<bool> {
        if stream.is_empty() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.write(stream, &mut out, pretty)?;
        out.flush()?;
        Ok(true)
    }

    /// Read a file into a fresh stream
    fn read_file(&self, path: &Path) -> Result<RowStream> {
        if !path.exists() {
            return Err(MigrateError::PathNotFound(path.to_path_buf()));
        }
        let mut stream = RowStream::new()?;
        let mut input = File::open(path)?;
        let count = self.read(&mut input, &mut stream)?;
        log::debug!("Read {} rows from {}", count, path.display());
        Ok(stream)
    }
}

/// Look up a format by name
pub fn format_for(name: &str) -> Result<Box<dyn Format>> {
    match name.to_ascii_lowercase().as_str() {
        "json" => Ok(Box::new(JsonFormat)),
        other => Err(MigrateError::UnknownFormat(other.to_string())),
    }
}
