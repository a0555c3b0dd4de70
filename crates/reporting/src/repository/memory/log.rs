//! In-memory log table.

use crate::repository::Result;
use crate::repository::traits::LogRepository;

/// In-memory log table; offsets are row indices.
pub struct InMemoryLog<T> {
    name: String,
    rows: Vec<T>,
}

impl<T> InMemoryLog<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }
}

impl<T> LogRepository<T> for InMemoryLog<T>
where
    T: Clone + Send,
{
    fn append(&mut self, row: &T) -> Result<u64> {
        self.rows.push(row.clone());
        Ok(self.rows.len() as u64 - 1)
    }

    fn read_all(&self) -> Result<Vec<T>> {
        Ok(self.rows.clone())
    }

    fn flush(&mut self) -> Result<()> {
        // No-op for in-memory - already "flushed"
        Ok(())
    }

    fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }
}
