//! Append-only, rewindable row buffer
//!
//! Rows are written once, then read back in one or more full passes. Each
//! row is stored as one JSON line in a temporary file so collections of any
//! size stay out of memory. The buffer is removed when the stream is dropped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};

use tempfile::NamedTempFile;

use super::Row;
use crate::error::Result;

/// Single-writer, rewindable sequence of rows
///
/// Not meant for concurrent readers: there is exactly one read cursor.
pub struct RowStream {
    file: NamedTempFile,
    writer: BufWriter<File>,
    reader: BufReader<File>,
    /// Bytes handed to the writer
    written: u64,
    /// Bytes consumed by the reader since the last rewind
    position: u64,
    rows: usize,
    unflushed: bool,
}

impl RowStream {
    /// Create an empty stream backed by a fresh temporary file
    pub fn new() -> Result<Self> {
        let file = NamedTempFile::new()?;
        let writer = BufWriter::new(file.reopen()?);
        let reader = BufReader::new(file.reopen()?);
        Ok(RowStream {
            file,
            writer,
            reader,
            written: 0,
            position: 0,
            rows: 0,
            unflushed: false,
        })
    }

    /// Append one row
    pub fn write(&mut self, row: &Row) -> Result<()> {
        let mut line = serde_json::to_vec(row)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.written += line.len() as u64;
        self.rows += 1;
        self.unflushed = true;
        Ok(())
    }

    /// Read the next row, or `None` at the end of the buffer
    pub fn read(&mut self) -> Result<Option<Row>> {
        self.flush()?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        self.position += read as u64;

        let row: Row = serde_json::from_str(line.trim_end_matches('\n'))?;
        Ok(Some(row))
    }

    /// Move the read cursor back to the first row
    pub fn rewind(&mut self) -> Result<()> {
        self.flush()?;
        self.reader.seek(SeekFrom::Start(0))?;
        self.position = 0;
        Ok(())
    }

    /// Whether nothing was ever written
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Whether the read cursor is at the end of the buffer
    pub fn is_end(&self) -> bool {
        self.position >= self.written
    }

    /// Number of rows written
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Discard the buffer now rather than on drop
    pub fn close(self) -> Result<()> {
        let RowStream { file, writer, reader, .. } = self;
        drop(writer);
        drop(reader);
        file.close()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.unflushed {
            self.writer.flush()?;
            self.unflushed = false;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream")
            .field("path", &self.file.path())
            .field("rows", &self.rows)
            .field("written", &self.written)
            .field("position", &self.position)
            .finish()
    }
}
