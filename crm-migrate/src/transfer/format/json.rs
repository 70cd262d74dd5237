//! JSON array format
//!
//! Files look like:
//!
//! ```text
//! [
//! {"id":"1","name":"Acme"},
//! {"id":"2","name":"Beta"}
//! ]
//! ```
//!
//! One row per element, rows separated by `,\n`. With pretty-printing each
//! row is indented on its own.

use std::fmt;
use std::io::{BufReader, Read, Write};

use serde::de::{DeserializeSeed, Deserializer, SeqAccess, Visitor};

use super::Format;
use crate::error::Result;
use crate::transfer::{Row, RowStream};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, stream: &mut RowStream, out: &mut dyn Write, pretty: bool) -> Result<()> {
        stream.rewind()?;
        out.write_all(b"[\n")?;

        while let Some(row) = stream.read()? {
            let encoded = if pretty {
                serde_json::to_string_pretty(&row)?
            } else {
                serde_json::to_string(&row)?
            };
            out.write_all(encoded.as_bytes())?;
            let separator: &[u8] = if stream.is_end() { b"\n" } else { b",\n" };
            out.write_all(separator)?;
        }

        out.write_all(b"]\n")?;
        Ok(())
    }

    fn read(&self, input: &mut dyn Read, stream: &mut RowStream) -> Result<usize> {
        let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(input));
        let count = RowSink { stream }.deserialize(&mut deserializer)?;
        deserializer.end()?;
        Ok(count)
    }
}

/// Pushes array elements into a stream as they are parsed
struct RowSink<'s> {
    stream: &'s mut RowStream,
}

impl<'de> DeserializeSeed<'de> for RowSink<'_> {
    type Value = usize;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for RowSink<'_> {
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of row objects")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<usize, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(row) = seq.next_element::<Row>()? {
            self.stream
                .write(&row)
                .map_err(serde::de::Error::custom)?;
            count += 1;
        }
        Ok(count)
    }
}
