use std::cell::Cell;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::store::{BulkUpdate, CacheInvalidation, JobStore};

/// Option bumped on every write while cache invalidation is enabled.
pub const LAST_CHANGED_OPTION: &str = "posts_last_changed";
pub const THUMBNAIL_KEY: &str = "_thumbnail_id";
pub const ATTACHED_FILE_KEY: &str = "_wp_attached_file";

static TABLE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]*$").unwrap());

const REQUIRED_TABLES: [&str; 4] = ["posts", "postmeta", "term_taxonomy", "options"];

pub fn validate_table_prefix(prefix: &str) -> Result<()> {
    if TABLE_PREFIX_RE.is_match(prefix) {
        Ok(())
    } else {
        Err(ImportError::InvalidTablePrefix(prefix.to_string()))
    }
}

/// WordPress-shaped content store backed by SQLite.
pub struct SqliteStore {
    conn: Connection,
    prefix: String,
    uploads_url: Option<String>,
    invalidation_suspended: Cell<bool>,
    writes_while_suspended: Cell<bool>,
}

impl SqliteStore {
    /// Open an existing site database. A missing file is an error, not a fresh database.
    pub fn open(path: &Path, prefix: &str) -> Result<Self> {
        validate_table_prefix(prefix)?;
        if !path.exists() {
            return Err(ImportError::Config(format!(
                "database '{}' does not exist",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let store = Self::from_connection(conn, prefix);
        store.verify_schema()?;
        Ok(store)
    }

    /// Create (or reuse) a site database at `path` with an empty schema installed.
    pub fn init(path: &Path, prefix: &str) -> Result<Self> {
        validate_table_prefix(prefix)?;
        let store = Self::from_connection(Connection::open(path)?, prefix);
        store.create_tables()?;
        Ok(store)
    }

    pub fn open_memory(prefix: &str) -> Result<Self> {
        validate_table_prefix(prefix)?;
        let store = Self::from_connection(Connection::open_in_memory()?, prefix);
        store.create_tables()?;
        Ok(store)
    }

    fn from_connection(conn: Connection, prefix: &str) -> Self {
        Self {
            conn,
            prefix: prefix.to_string(),
            uploads_url: None,
            invalidation_suspended: Cell::new(false),
            writes_while_suspended: Cell::new(false),
        }
    }

    /// Base URL prepended to `_wp_attached_file` when resolving image URLs.
    pub fn with_uploads_url(mut self, uploads_url: Option<String>) -> Self {
        self.uploads_url = uploads_url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table(&self, base: &str) -> String {
        format!("{}{}", self.prefix, base)
    }

    fn verify_schema(&self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        for base in REQUIRED_TABLES {
            let name = self.table(base);
            if !stmt.exists(params![name])? {
                return Err(ImportError::Config(format!(
                    "table '{name}' not found (check table_prefix)"
                )));
            }
        }
        Ok(())
    }

    fn create_tables(&self) -> Result<()> {
        let posts = self.table("posts");
        let postmeta = self.table("postmeta");
        let term_taxonomy = self.table("term_taxonomy");
        let options = self.table("options");
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {posts} (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                post_title TEXT NOT NULL DEFAULT '',
                post_status TEXT NOT NULL DEFAULT 'publish',
                post_type TEXT NOT NULL DEFAULT 'post',
                guid TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS {posts}_type_status ON {posts}(post_type, post_status);
            CREATE TABLE IF NOT EXISTS {postmeta} (
                meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL DEFAULT 0,
                meta_key TEXT,
                meta_value TEXT
            );
            CREATE INDEX IF NOT EXISTS {postmeta}_post_key ON {postmeta}(post_id, meta_key);
            CREATE TABLE IF NOT EXISTS {term_taxonomy} (
                term_taxonomy_id INTEGER PRIMARY KEY AUTOINCREMENT,
                term_id INTEGER NOT NULL DEFAULT 0,
                taxonomy TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                parent INTEGER NOT NULL DEFAULT 0,
                count INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS {term_taxonomy}_taxonomy ON {term_taxonomy}(taxonomy);
            CREATE TABLE IF NOT EXISTS {options} (
                option_id INTEGER PRIMARY KEY AUTOINCREMENT,
                option_name TEXT NOT NULL UNIQUE,
                option_value TEXT NOT NULL DEFAULT ''
            );"
        ))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Fixture helpers (site setup, not part of the import path)
    // -----------------------------------------------------------------------

    pub fn insert_post(&self, title: &str, post_type: &str, status: &str) -> Result<u64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (post_title, post_type, post_status) VALUES (?1, ?2, ?3)",
                self.table("posts")
            ),
            params![title, post_type, status],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    /// Attach a featured image to `post_id`; returns the attachment id.
    pub fn insert_attachment(&self, post_id: u64, guid: &str, file: Option<&str>) -> Result<u64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (post_title, post_type, post_status, guid) VALUES ('', 'attachment', 'inherit', ?1)",
                self.table("posts")
            ),
            params![guid],
        )?;
        let attachment_id = self.conn.last_insert_rowid() as u64;
        self.insert_meta(post_id, THUMBNAIL_KEY, &attachment_id.to_string())?;
        if let Some(file) = file {
            self.insert_meta(attachment_id, ATTACHED_FILE_KEY, file)?;
        }
        Ok(attachment_id)
    }

    /// Unconditional insert; duplicates for the same key are allowed, as in WordPress.
    pub fn insert_meta(&self, post_id: u64, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (post_id, meta_key, meta_value) VALUES (?1, ?2, ?3)",
                self.table("postmeta")
            ),
            params![post_id, key, value],
        )?;
        Ok(())
    }

    pub fn insert_term_taxonomy(&self, term_id: u64, taxonomy: &str) -> Result<u64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (term_id, taxonomy) VALUES (?1, ?2)",
                self.table("term_taxonomy")
            ),
            params![term_id, taxonomy],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    pub fn set_option(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (option_name, option_value) VALUES (?1, ?2)
                 ON CONFLICT(option_name) DO UPDATE SET option_value = excluded.option_value",
                self.table("options")
            ),
            params![name, value],
        )?;
        Ok(())
    }

    /// Every stored value for a key, oldest first.
    pub fn meta_values(&self, post_id: u64, key: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT COALESCE(meta_value, '') FROM {} WHERE post_id = ?1 AND meta_key = ?2 ORDER BY meta_id",
            self.table("postmeta")
        ))?;
        let rows = stmt.query_map(params![post_id, key], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn taxonomy(&self, term_taxonomy_id: u64) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT taxonomy FROM {} WHERE term_taxonomy_id = ?1",
                    self.table("term_taxonomy")
                ),
                params![term_taxonomy_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    // -----------------------------------------------------------------------
    // Cache invalidation
    // -----------------------------------------------------------------------

    fn touch(&self) -> Result<()> {
        if self.invalidation_suspended.get() {
            self.writes_while_suspended.set(true);
            return Ok(());
        }
        self.bump_last_changed()
    }

    fn bump_last_changed(&self) -> Result<()> {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.set_option(LAST_CHANGED_OPTION, &stamp)
    }
}

impl JobStore for SqliteStore {
    fn list_job_ids(&self, post_type: &str, status: &str) -> Result<Vec<u64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT ID FROM {} WHERE post_type = ?1 AND post_status = ?2 ORDER BY ID",
            self.table("posts")
        ))?;
        let rows = stmt.query_map(params![post_type, status], |row| row.get::<_, u64>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn title(&self, id: u64) -> Result<String> {
        let title: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT post_title FROM {} WHERE ID = ?1", self.table("posts")),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(title.unwrap_or_default())
    }

    fn meta(&self, id: u64, key: &str) -> Result<Option<String>> {
        let value: Option<Option<String>> = self
            .conn
            .query_row(
                &format!(
                    "SELECT meta_value FROM {} WHERE post_id = ?1 AND meta_key = ?2 ORDER BY meta_id LIMIT 1",
                    self.table("postmeta")
                ),
                params![id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn add_meta(&self, id: u64, key: &str, value: &str) -> Result<bool> {
        let exists = self
            .conn
            .prepare(&format!(
                "SELECT 1 FROM {} WHERE post_id = ?1 AND meta_key = ?2 LIMIT 1",
                self.table("postmeta")
            ))?
            .exists(params![id, key])?;
        if exists {
            debug!(job_id = id, key, "meta already set, keeping existing value");
            return Ok(false);
        }
        self.insert_meta(id, key, value)?;
        self.touch()?;
        Ok(true)
    }

    fn update_meta(&self, id: u64, key: &str, value: &str) -> Result<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET meta_value = ?3 WHERE post_id = ?1 AND meta_key = ?2",
                self.table("postmeta")
            ),
            params![id, key, value],
        )?;
        if changed == 0 {
            self.insert_meta(id, key, value)?;
        }
        self.touch()
    }

    fn primary_image_url(&self, id: u64) -> Result<Option<String>> {
        let Some(attachment_id) = self
            .meta(id, THUMBNAIL_KEY)?
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        else {
            return Ok(None);
        };

        let guid: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT guid FROM {} WHERE ID = ?1 AND post_type = 'attachment'",
                    self.table("posts")
                ),
                params![attachment_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(guid) = guid else {
            return Ok(None);
        };

        if let (Some(base), Some(file)) = (&self.uploads_url, self.meta(attachment_id, ATTACHED_FILE_KEY)?)
            && !file.is_empty()
        {
            return Ok(Some(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                file.trim_start_matches('/')
            )));
        }

        Ok(Some(guid).filter(|g| !g.is_empty()))
    }

    fn option(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT option_value FROM {} WHERE option_name = ?1",
                    self.table("options")
                ),
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn bulk_update(&self, update: &BulkUpdate) -> Result<usize> {
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            self.table(update.table.base_name()),
            update.set.column,
            update.filter.column
        );
        let rows = self
            .conn
            .execute(&sql, params![update.set.value, update.filter.value])?;
        if rows > 0 {
            self.touch()?;
        }
        Ok(rows)
    }
}

impl CacheInvalidation for SqliteStore {
    fn suspend_cache_invalidation(&self, suspend: bool) -> bool {
        let previous = self.invalidation_suspended.replace(suspend);
        if previous && !suspend && self.writes_while_suspended.replace(false) {
            // One bump covers everything written while suspended.
            if let Err(err) = self.bump_last_changed() {
                warn!(error = %err, "failed to record cache invalidation after resume");
            }
        }
        previous
    }

    fn cache_invalidation_suspended(&self) -> bool {
        self.invalidation_suspended.get()
    }
}
