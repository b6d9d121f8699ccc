//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the canonical `tasks` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `try_new` verifies schema version and required columns before any
//!   repository call can touch application data.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::task::{Task, TaskId};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    favorite,
    completed
FROM tasks";

const REQUIRED_TABLE: &str = "tasks";
const REQUIRED_COLUMNS: &[&str] = &[
    "uuid",
    "title",
    "description",
    "favorite",
    "completed",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Membership filter for list queries and live views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Active,
    Completed,
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    /// Persists a new task with a generated ID and default flags.
    fn create_task(&self, title: &str, description: &str) -> RepoResult<Task>;
    /// Full-record replace by `task.id`.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn set_favorite(&self, id: TaskId, value: bool) -> RepoResult<()>;
    fn set_completed(&self, id: TaskId, value: bool) -> RepoResult<()>;
    /// Permanently removes the row; there is no tombstone.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, filter: TaskFilter) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a migrated connection after validating its schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` does not match
    ///   the latest migration known by this binary.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the physical
    ///   schema does not carry the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({REQUIRED_TABLE});"))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(row.get::<_, String>("name")?);
        }

        if columns.is_empty() {
            return Err(RepoError::MissingRequiredTable(REQUIRED_TABLE));
        }
        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|name| name == required) {
                return Err(RepoError::MissingRequiredColumn {
                    table: REQUIRED_TABLE,
                    column: required,
                });
            }
        }

        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, title: &str, description: &str) -> RepoResult<Task> {
        let task = Task::new(title, description);

        self.conn.execute(
            "INSERT INTO tasks (uuid, title, description, favorite, completed)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                bool_to_int(task.favorite),
                bool_to_int(task.completed),
            ],
        )?;

        Ok(task)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                favorite = ?3,
                completed = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                task.title.as_str(),
                task.description.as_str(),
                bool_to_int(task.favorite),
                bool_to_int(task.completed),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn set_favorite(&self, id: TaskId, value: bool) -> RepoResult<()> {
        self.set_flag(id, "favorite", value)
    }

    fn set_completed(&self, id: TaskId, value: bool) -> RepoResult<()> {
        self.set_flag(id, "completed", value)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, filter: TaskFilter) -> RepoResult<Vec<Task>> {
        let mut sql = TASK_SELECT_SQL.to_string();
        match filter {
            TaskFilter::All => {}
            TaskFilter::Active => sql.push_str(" WHERE completed = 0"),
            TaskFilter::Completed => sql.push_str(" WHERE completed = 1"),
        }
        // Contract leaves ordering open; keep it stable for UI diffing.
        sql.push_str(" ORDER BY created_at ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

impl SqliteTaskRepository<'_> {
    fn set_flag(&self, id: TaskId, column: &'static str, value: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE tasks
                 SET {column} = ?1, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?2;"
            ),
            params![bool_to_int(value), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    Ok(Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        favorite: parse_flag(row, "favorite")?,
        completed: parse_flag(row, "completed")?,
    })
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in tasks.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
