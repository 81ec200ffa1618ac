//! JSONL (JSON Lines) storage.
//!
//! Each collection is one append-only file. Every line holds a key and the
//! full document written for it; the last line for a key is the current
//! version.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{Document, DocumentStore, MonotonicClock, StorageConfig, StorageError};

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Whether the file is missing, empty or ends with a newline.
    fn ends_cleanly(&self) -> Result<bool, StorageError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Ok(true);
        }

        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    /// Append a single entity to the file.
    ///
    /// Refuses to write after an incomplete trailing record, which would
    /// otherwise swallow the new line.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        if !self.ends_cleanly()? {
            error!("Refusing to append to {:?}: incomplete final record", self.path);
            return Err(StorageError::TornWrite(self.path.clone()));
        }

        let mut line = serde_json::to_string(entity)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!("Appended entity to {:?}", self.path);
        Ok(())
    }

    /// Write entities, replacing the entire file.
    ///
    /// The new contents go to a sibling temp file that is synced and renamed
    /// over the original, so a failed rewrite leaves the old file in place.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let temp_path = self.path.with_extension("jsonl.tmp");
        let count = match write_lines(&temp_path, entities) {
            Ok(count) => count,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        fs::rename(&temp_path, &self.path)?;
        info!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }
}

fn write_lines<T: Serialize>(path: &Path, entities: &[T]) -> Result<usize, StorageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut count = 0;

    for entity in entities {
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
        count += 1;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(count)
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Read all entities from the file.
    ///
    /// Blank lines are ignored. Any line that fails to parse fails the
    /// whole read with [`StorageError::CorruptLine`].
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let entity = serde_json::from_str(&line).map_err(|source| {
                error!("Failed to parse line {} in {:?}: {}", line_num + 1, self.path, source);
                StorageError::CorruptLine {
                    path: self.path.clone(),
                    line: line_num + 1,
                    source,
                }
            })?;
            entities.push(entity);
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// One line of a collection file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    key: String,
    doc: Document,
}

/// Document store backed by one JSONL file per collection.
pub struct JsonlStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
    clock: MonotonicClock,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
            clock: MonotonicClock::default(),
        }
    }

    /// Current version of every document, keyed and sorted.
    fn latest(&self, collection: &str) -> Result<BTreeMap<String, Document>, StorageError> {
        let reader = JsonlReader::<StoredDocument>::new(self.config.collection_path(collection));
        Ok(reader
            .read_all()?
            .into_iter()
            .map(|stored| (stored.key, stored.doc))
            .collect())
    }

    /// Rewrite a collection file so each key appears once.
    ///
    /// Fails without touching the file when any line is unreadable.
    pub async fn compact(&self, collection: &str) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        let docs: Vec<StoredDocument> = self
            .latest(collection)?
            .into_iter()
            .map(|(key, doc)| StoredDocument { key, doc })
            .collect();
        JsonlWriter::new(self.config.collection_path(collection)).write_all(&docs)
    }
}

#[async_trait]
impl DocumentStore for JsonlStore {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StorageError> {
        Ok(self.latest(collection)?.remove(key))
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let writer = JsonlWriter::new(self.config.collection_path(collection));
        writer.append(&StoredDocument {
            key: key.to_string(),
            doc,
        })
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<(String, Document)>, StorageError> {
        Ok(self
            .latest(collection)?
            .into_iter()
            .filter(|(_, doc)| doc.get(field) == Some(value))
            .collect())
    }

    async fn server_timestamp(&self) -> Result<DateTime<Utc>, StorageError> {
        Ok(self.clock.now())
    }
}
