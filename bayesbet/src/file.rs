//! Reading and writing JSON documents.

use std::fs::File;
use std::io::{BufReader, BufWriter, Error, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{from_reader, to_writer_pretty};

/// Reads a JSON-encoded value from the file at `path`.
pub fn read_json<D: DeserializeOwned>(path: impl AsRef<Path>) -> Result<D, Error> {
    let reader = BufReader::new(File::open(path)?);
    Ok(from_reader(reader)?)
}

/// Writes `value` as pretty-printed JSON to the file at `path`, replacing any existing file.
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

pub trait ReadJsonFile<D> {
    fn read_json_file(path: impl AsRef<Path>) -> Result<D, Error>;
}

impl<D: DeserializeOwned> ReadJsonFile<D> for D {
    fn read_json_file(path: impl AsRef<Path>) -> Result<D, Error> {
        read_json(path)
    }
}

pub trait WriteJsonFile<S: Serialize> {
    fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), Error>;
}

impl<S: Serialize> WriteJsonFile<S> for S {
    fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        write_json(path, self)
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::process;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<f64>,
    }

    #[test]
    fn write_then_read() {
        let path = env::temp_dir().join(format!("bayesbet-file-{}.json", process::id()));
        let sample = Sample {
            name: "sample".into(),
            values: vec![0.25, 0.5],
        };
        sample.write_json_file(&path).unwrap();
        let read = Sample::read_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(sample, read);
    }

    #[test]
    fn read_missing() {
        let path = env::temp_dir().join("bayesbet-file-does-not-exist.json");
        assert!(Sample::read_json_file(path).is_err());
    }
}
