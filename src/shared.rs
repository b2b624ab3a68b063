use std::sync::Arc;

use parking_lot::Mutex;

use crate::database::{Database, Metadata};
use crate::error::Result;

/// Cloneable handle that serializes every access to one [Database].
///
/// Queries, metadata, save and load each take the lock for their whole
/// duration, so at most one of them touches the tables at a time.
#[derive(Debug, Clone, Default)]
pub struct SharedDatabase {
    inner: Arc<Mutex<Database>>,
}

impl SharedDatabase {
    pub fn new(database: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(database)),
        }
    }

    /// See [Database::execute].
    pub fn execute(&self, query: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.lock().execute(query)
    }

    pub fn metadata(&self) -> Metadata {
        self.inner.lock().metadata()
    }

    pub fn save(&self) -> Result<()> {
        self.inner.lock().save()
    }

    pub fn load(&self) -> Result<()> {
        self.inner.lock().load()
    }

    /// Runs `f` with exclusive access to the database.
    pub fn with<R>(&self, f: impl FnOnce(&mut Database) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<Database> for SharedDatabase {
    fn from(database: Database) -> Self {
        Self::new(database)
    }
}
