//! Sled user repository.
//!
//! Users are stored as JSON objects in one tree, keyed by an arbitrary id
//! (usually the username). Lookups scan the tree.

use std::path::Path;

use sled::{Db, Tree};

use authgate_core::UserRecord;

use crate::error::Result;
use crate::table::UserRepository;

/// Default tree holding user records.
pub const DEFAULT_USERS_TREE: &str = "users";

/// Looks users up in a sled tree.
#[derive(Debug, Clone)]
pub struct SledRepository {
    tree: Tree,
}

impl SledRepository {
    /// Wrap an open tree.
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    /// Open or create the named tree in a database.
    pub fn from_db(db: &Db, tree_name: &str) -> Result<Self> {
        let tree = db.open_tree(tree_name)?;
        Ok(Self { tree })
    }

    /// Open a database directory and use the default tree.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_tree(path, DEFAULT_USERS_TREE)
    }

    /// Open a database directory and use the named tree.
    pub fn open_tree(path: impl AsRef<Path>, tree_name: &str) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db, tree_name)
    }

    /// Store a record under `key`.
    pub fn insert(&self, key: &str, record: &UserRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.tree.flush()?;
        Ok(())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn scan(&self, field: &str, value: &str) -> Result<Option<UserRecord>> {
        for item in self.tree.iter() {
            let (key, bytes) = item?;
            let record: UserRecord = match serde_json::from_slice(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        key = %String::from_utf8_lossy(&key),
                        error = %e,
                        "skipping malformed user record"
                    );
                    continue;
                }
            };
            if record.field_equals(field, value) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

impl UserRepository for SledRepository {
    fn find_by_field(&self, field: &str, value: &str) -> authgate_core::Result<Option<UserRecord>> {
        Ok(self.scan(field, value)?)
    }
}
