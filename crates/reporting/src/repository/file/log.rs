//! Append-only log table file.
//!
//! A generic `FileRepository<T>` stores any serializable row type as JSON
//! lines. It backs both the event log and the summary log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::repository::traits::LogRepository;
use crate::repository::{RepositoryError, Result};

/// Generic file-based repository for append-only log tables.
///
/// Rows of type `T` are stored one per line:
/// ```text
/// {"time":10,"management_area":1,...}
/// {"time":10,"management_area":1,...}
/// ```
///
/// Every append is flushed before it returns, so the file always holds a
/// complete prefix of the rows handed to it.
pub struct FileRepository<T> {
    /// Table name (filename without path)
    name: String,
    /// Full path to the log file
    path: PathBuf,
    writer: BufWriter<File>,
    /// Current byte offset for next write
    current_offset: u64,
    /// Rows appended through this handle
    rows: u64,
    _phantom: PhantomData<T>,
}

impl<T> FileRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a new log file.
    ///
    /// # Errors
    ///
    /// Returns error if the file already exists (prevents accidental overwrites).
    pub fn create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let filename = filename.as_ref();

        std::fs::create_dir_all(base_dir).map_err(RepositoryError::Io)?;

        let path = base_dir.join(filename);

        if path.exists() {
            return Err(RepositoryError::LogAlreadyExists(
                path.display().to_string(),
            ));
        }

        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .map_err(RepositoryError::Io)?;

        tracing::debug!("Created log table: {}", path.display());

        Ok(Self::with_file(filename, path, file, 0))
    }

    /// Open an existing log file for appending.
    pub fn open(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let filename = filename.as_ref();
        let path = base_dir.as_ref().join(filename);

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(RepositoryError::Io)?;

        let current_offset = file.metadata().map_err(RepositoryError::Io)?.len();

        tracing::debug!(
            "Opened log table: {} at offset {}",
            path.display(),
            current_offset
        );

        Ok(Self::with_file(filename, path, file, current_offset))
    }

    /// Open or create a log file.
    ///
    /// Creates the directory and file if they don't exist, or opens the
    /// existing file for appending.
    pub fn open_or_create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir).map_err(RepositoryError::Io)?;

        let filename = filename.as_ref();
        let path = base_dir.join(filename);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(RepositoryError::Io)?;

        let current_offset = file.metadata().map_err(RepositoryError::Io)?.len();

        tracing::debug!(
            "Opened/created log table: {} at offset {}",
            path.display(),
            current_offset
        );

        Ok(Self::with_file(filename, path, file, current_offset))
    }

    fn with_file(filename: &str, path: PathBuf, file: File, current_offset: u64) -> Self {
        Self {
            name: filename.to_string(),
            path,
            writer: BufWriter::new(file),
            current_offset,
            rows: 0,
            _phantom: PhantomData,
        }
    }

    /// Append a row and flush it to disk.
    ///
    /// Returns the byte offset where the row starts.
    pub fn append(&mut self, row: &T) -> Result<u64> {
        let offset = self.current_offset;

        let mut line =
            serde_json::to_vec(row).map_err(|e| RepositoryError::Json(e.to_string()))?;
        line.push(b'\n');

        self.writer.write_all(&line).map_err(RepositoryError::Io)?;
        self.flush()?;

        self.current_offset += line.len() as u64;
        self.rows += 1;

        Ok(offset)
    }

    /// Read every row stored in the file, including rows written before this
    /// handle was opened.
    pub fn read_all(&self) -> Result<Vec<T>> {
        let file = File::open(&self.path).map_err(RepositoryError::Io)?;
        let reader = BufReader::new(file);

        let mut rows = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(RepositoryError::Io)?;
            if line.trim().is_empty() {
                continue;
            }
            let row = serde_json::from_str(&line).map_err(|e| {
                RepositoryError::Json(format!("{} line {}: {}", self.name, number + 1, e))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(RepositoryError::Io)?;
        Ok(())
    }

    /// Get the current size of the log in bytes.
    pub fn size(&self) -> u64 {
        self.current_offset
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Drop for FileRepository<T> {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!("Failed to flush log table '{}' on drop: {}", self.name, e);
        }
    }
}

impl<T> LogRepository<T> for FileRepository<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    fn append(&mut self, row: &T) -> Result<u64> {
        self.append(row)
    }

    fn read_all(&self) -> Result<Vec<T>> {
        self.read_all()
    }

    fn flush(&mut self) -> Result<()> {
        self.flush()
    }

    fn row_count(&self) -> u64 {
        self.rows
    }

    fn name(&self) -> &str {
        self.name()
    }
}
