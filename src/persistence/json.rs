use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads a JSON document from `path`. Syntax and schema errors surface as
/// `io::ErrorKind::InvalidData`.
pub fn read_json<T: DeserializeOwned>(path: &str) -> io::Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Writes `value` to `path` as pretty-printed JSON, replacing any existing file.
pub fn write_json<T: Serialize>(value: &T, path: &str) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()
}
