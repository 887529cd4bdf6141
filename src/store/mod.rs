//! Entity Store
//! Mission: Durable CRUD for users, lists and items with cascade-enforced ownership
//!
//! # Schema
//!
//! ```sql
//! users (id, name, username UNIQUE, password_hash, is_admin)
//! lists (id, name, owner_id -> users(id) ON DELETE CASCADE)
//! items (id, name, list_id  -> lists(id) ON DELETE CASCADE)
//! ```
//!
//! Foreign keys are switched on for every connection; SQLite leaves them off
//! by default and cascades silently do nothing without it.

pub mod seed;

use crate::models::{Item, TodoList, User};
use parking_lot::Mutex;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on a locked database file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already exists: {0}")]
    DuplicateUsername(String),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed store shared by every request.
///
/// All statements run on one connection behind a mutex, so a read issued
/// after a write always observes it.
pub struct TodoStore {
    conn: Arc<Mutex<Connection>>,
}

impl TodoStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (tests, throwaway instances).
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // =========================================================================
    // USERS
    // =========================================================================

    pub fn create_user(
        &self,
        name: &str,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> StoreResult<User> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (name, username, password_hash, is_admin) VALUES (?1, ?2, ?3, ?4)",
            params![name, username, password_hash, is_admin],
        )
        .map_err(|e| match constraint_kind(&e) {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => StoreError::DuplicateUsername(username.to_string()),
            _ => StoreError::Sqlite(e),
        })?;

        let id = conn.last_insert_rowid();
        info!(user_id = id, username, is_admin, "Created user");

        Ok(User {
            id,
            name: name.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        })
    }

    pub fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT id, name, username, password_hash, is_admin FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT id, name, username, password_hash, is_admin FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, username, password_hash, is_admin FROM users ORDER BY id",
        )?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn count_users(&self) -> StoreResult<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Returns the updated user, or `None` if it no longer exists.
    pub fn rename_user(&self, id: i64, name: &str) -> StoreResult<Option<User>> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE users SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?
        };
        if changed == 0 {
            return Ok(None);
        }
        self.get_user(id)
    }

    pub fn set_password_hash(&self, id: i64, password_hash: &str) -> StoreResult<Option<User>> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![password_hash, id],
            )?
        };
        if changed == 0 {
            return Ok(None);
        }
        self.get_user(id)
    }

    /// Delete a user together with its lists and their items.
    /// Returns `false` if no such user existed.
    pub fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if changed > 0 {
            info!(user_id = id, "Deleted user (lists and items cascaded)");
        }
        Ok(changed > 0)
    }

    // =========================================================================
    // LISTS
    // =========================================================================

    pub fn create_list(&self, name: &str, owner_id: i64) -> StoreResult<TodoList> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO lists (name, owner_id) VALUES (?1, ?2)",
            params![name, owner_id],
        )
        .map_err(|e| match constraint_kind(&e) {
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StoreError::MissingReference("owner"),
            _ => StoreError::Sqlite(e),
        })?;

        let id = conn.last_insert_rowid();
        debug!(list_id = id, owner_id, "Created list");

        Ok(TodoList {
            id,
            name: name.to_string(),
            owner_id,
            owner_name: None,
        })
    }

    pub fn get_list(&self, id: i64) -> StoreResult<Option<TodoList>> {
        let conn = self.conn.lock();
        let list = conn
            .query_row(
                "SELECT l.id, l.name, l.owner_id, u.name
                 FROM lists l JOIN users u ON u.id = l.owner_id
                 WHERE l.id = ?1",
                params![id],
                list_from_row,
            )
            .optional()?;
        Ok(list)
    }

    /// Current owner of a list, read at call time.
    pub fn list_owner(&self, list_id: i64) -> StoreResult<Option<i64>> {
        let conn = self.conn.lock();
        let owner = conn
            .query_row(
                "SELECT owner_id FROM lists WHERE id = ?1",
                params![list_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }

    pub fn lists_for_owner(&self, owner_id: i64) -> StoreResult<Vec<TodoList>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT l.id, l.name, l.owner_id, u.name
             FROM lists l JOIN users u ON u.id = l.owner_id
             WHERE l.owner_id = ?1
             ORDER BY l.id",
        )?;
        let lists = stmt
            .query_map(params![owner_id], list_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    pub fn all_lists(&self) -> StoreResult<Vec<TodoList>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT l.id, l.name, l.owner_id, u.name
             FROM lists l JOIN users u ON u.id = l.owner_id
             ORDER BY l.id",
        )?;
        let lists = stmt
            .query_map([], list_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    pub fn rename_list(&self, id: i64, name: &str) -> StoreResult<Option<TodoList>> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE lists SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?
        };
        if changed == 0 {
            return Ok(None);
        }
        self.get_list(id)
    }

    pub fn delete_list(&self, id: i64) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM lists WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    pub fn create_item(&self, name: &str, list_id: i64) -> StoreResult<Item> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO items (name, list_id) VALUES (?1, ?2)",
            params![name, list_id],
        )
        .map_err(|e| match constraint_kind(&e) {
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StoreError::MissingReference("list"),
            _ => StoreError::Sqlite(e),
        })?;

        Ok(Item {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            list_id,
        })
    }

    pub fn get_item(&self, id: i64) -> StoreResult<Option<Item>> {
        let conn = self.conn.lock();
        let item = conn
            .query_row(
                "SELECT id, name, list_id FROM items WHERE id = ?1",
                params![id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Owner of the list an item belongs to, read at call time.
    pub fn item_owner(&self, item_id: i64) -> StoreResult<Option<i64>> {
        let conn = self.conn.lock();
        let owner = conn
            .query_row(
                "SELECT l.owner_id FROM items i JOIN lists l ON l.id = i.list_id WHERE i.id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }

    pub fn items_for_list(&self, list_id: i64) -> StoreResult<Vec<Item>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, list_id FROM items WHERE list_id = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![list_id], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn rename_item(&self, id: i64, name: &str) -> StoreResult<Option<Item>> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE items SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?
        };
        if changed == 0 {
            return Ok(None);
        }
        self.get_item(id)
    }

    pub fn delete_item(&self, id: i64) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_lists_owner ON lists(owner_id);

        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_items_list ON items(list_id);
        "#,
    )?;
    Ok(())
}

/// Extended result code of a constraint violation, if `e` is one.
fn constraint_kind(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(err.extended_code)
        }
        _ => None,
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get(4)?,
    })
}

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<TodoList> {
    Ok(TodoList {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        owner_name: row.get(3)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        list_id: row.get(2)?,
    })
}
