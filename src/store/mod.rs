pub mod sqlite;

use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::model::{MetaWrite, WriteMode};

/// Record store the importer runs against.
///
/// Attribute writes come in two explicit flavours so callers (and tests) can
/// see which semantics were asked for: `add_meta` never replaces an existing
/// value, `update_meta` always does.
pub trait JobStore {
    /// IDs of every record with the given type and status, ascending.
    fn list_job_ids(&self, post_type: &str, status: &str) -> Result<Vec<u64>>;

    fn title(&self, id: u64) -> Result<String>;

    fn meta(&self, id: u64, key: &str) -> Result<Option<String>>;

    /// Set-if-absent. Returns `true` when a value was written.
    fn add_meta(&self, id: u64, key: &str, value: &str) -> Result<bool>;

    /// Set-or-overwrite.
    fn update_meta(&self, id: u64, key: &str, value: &str) -> Result<()>;

    /// Full-size URL of the record's featured image, if one is attached.
    fn primary_image_url(&self, id: u64) -> Result<Option<String>>;

    /// Site-wide option value.
    fn option(&self, name: &str) -> Result<Option<String>>;

    /// Returns the number of rows changed.
    fn bulk_update(&self, update: &BulkUpdate) -> Result<usize>;

    fn meta_or_empty(&self, id: u64, key: &str) -> Result<String> {
        Ok(self.meta(id, key)?.unwrap_or_default())
    }

    fn apply_write(&self, id: u64, write: &MetaWrite) -> Result<()> {
        match write.mode {
            WriteMode::SetIfAbsent => {
                self.add_meta(id, write.key, &write.value)?;
            }
            WriteMode::Overwrite => self.update_meta(id, write.key, &write.value)?,
        }
        Ok(())
    }
}

/// Toggle for the store's cache-invalidation side channel.
pub trait CacheInvalidation {
    /// Suspend (`true`) or resume (`false`) invalidation. Returns the previous state.
    fn suspend_cache_invalidation(&self, suspend: bool) -> bool;

    fn cache_invalidation_suspended(&self) -> bool;
}

/// Everything an importer needs from the content store.
pub trait ContentStore: JobStore + CacheInvalidation {
    fn as_job_store(&self) -> &dyn JobStore;

    fn as_cache(&self) -> &dyn CacheInvalidation;
}

impl<T: JobStore + CacheInvalidation> ContentStore for T {
    fn as_job_store(&self) -> &dyn JobStore {
        self
    }

    fn as_cache(&self) -> &dyn CacheInvalidation {
        self
    }
}

/// Suspends cache invalidation for its lifetime and re-enables it on drop,
/// whether the scope ends normally, through `?`, or by unwinding.
pub struct CacheSuspension<'a> {
    cache: &'a dyn CacheInvalidation,
}

impl<'a> CacheSuspension<'a> {
    pub fn new(cache: &'a dyn CacheInvalidation) -> Self {
        cache.suspend_cache_invalidation(true);
        debug!("cache invalidation suspended");
        Self { cache }
    }
}

impl Drop for CacheSuspension<'_> {
    fn drop(&mut self) {
        self.cache.suspend_cache_invalidation(false);
        debug!("cache invalidation resumed");
    }
}

// ---------------------------------------------------------------------------
// Bulk updates
// ---------------------------------------------------------------------------

/// Tables a bulk update may target. Closed so no caller-supplied text ever
/// reaches an identifier position in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    TermTaxonomy,
}

impl Table {
    /// Table name without the site prefix.
    pub fn base_name(self) -> &'static str {
        match self {
            Self::TermTaxonomy => "term_taxonomy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Taxonomy,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Self::Taxonomy => "taxonomy",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: Column,
    pub value: String,
}

/// `UPDATE table SET set.column = set.value WHERE filter.column = filter.value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdate {
    pub table: Table,
    pub set: Assignment,
    pub filter: Assignment,
}

impl BulkUpdate {
    pub fn rename_taxonomy(from: &str, to: &str) -> Self {
        Self {
            table: Table::TermTaxonomy,
            set: Assignment {
                column: Column::Taxonomy,
                value: to.to_string(),
            },
            filter: Assignment {
                column: Column::Taxonomy,
                value: from.to_string(),
            },
        }
    }
}
