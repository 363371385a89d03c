//! JSONL block journal - append-only writer and replay reader
//!
//! One JSON line per committed block, rotated daily. Public writes and
//! private-collection writes go to separate journals so the private payloads
//! never share a file with the globally readable range.
//!
//! The private half of a block is appended first. The public line is the
//! commit marker: a block counts as committed only once it is present.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{StateError, StateResult};
use crate::stub::ChaincodeEvent;

/// A committed invocation's public write set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub number: u64,
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub creator: String,
    pub writes: Vec<WriteRecord>,
    /// Number of writes in the matching [`PrivateBlockRecord`]
    #[serde(default)]
    pub private_writes: usize,
    pub event: Option<ChaincodeEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRecord {
    pub key: String,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
    pub is_delete: bool,
}

/// A committed invocation's private-collection write set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateBlockRecord {
    pub number: u64,
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub writes: Vec<PrivateWriteRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateWriteRecord {
    pub collection: String,
    pub key: String,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// Append-only JSONL journal
pub struct Journal {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
}

impl Journal {
    /// Create a journal rooted at the given directory
    pub fn new(base_path: impl AsRef<Path>) -> StateResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
        })
    }

    /// Append one record to the file for `timestamp`'s date
    pub fn append<T: Serialize>(
        &mut self,
        timestamp: DateTime<Utc>,
        record: &T,
    ) -> StateResult<()> {
        let date = timestamp.format("%Y-%m-%d").to_string();

        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    fn rotate_file(&mut self, date: &str) -> StateResult<()> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// List all JSONL files in name (date) order
    pub fn list_files(&self) -> StateResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read every record from every file
    pub fn read_all<T: DeserializeOwned>(&self) -> StateResult<Vec<T>> {
        let mut records = Vec::new();

        for file_path in self.list_files()? {
            let reader = BufReader::new(File::open(&file_path)?);

            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(&line).map_err(|e| {
                    StateError::InvalidFile(format!(
                        "{}:{}: {}",
                        file_path.display(),
                        line_no + 1,
                        e
                    ))
                })?;
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> StateResult<()> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Byte payloads as lowercase hex strings
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
