use std::path::{Path, PathBuf};

use async_trait::async_trait;
use audit_core::{
    ContextRecord, NewProject, PipelineError, Project, StepContext, StepRecord, WebsiteSummary,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage task join error: {0}")]
    Task(String),

    #[error("project {0} not found")]
    ProjectNotFound(i64),
}

impl From<StoreError> for PipelineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ProjectNotFound(project_id) => PipelineError::project_not_found(project_id),
            other => PipelineError::persistence(other),
        }
    }
}

/// Writes produced by one successful step execution.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStepRun {
    pub project_id: i64,
    pub step_number: u32,
    pub title: String,
    pub content: String,
    pub website_summary: Option<String>,
    pub context: StepContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStepRun {
    pub step: StepRecord,
    pub website_summary: Option<WebsiteSummary>,
    pub context: ContextRecord,
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn init(&self) -> StoreResult<()>;

    async fn create_project(&self, project: NewProject) -> StoreResult<Project>;
    async fn get_project(&self, project_id: i64) -> StoreResult<Option<Project>>;
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Latest execution of `step_number` for the project.
    async fn get_step(&self, project_id: i64, step_number: u32)
        -> StoreResult<Option<StepRecord>>;
    /// Every step execution, ordered by step number then insertion.
    async fn list_steps(&self, project_id: i64) -> StoreResult<Vec<StepRecord>>;
    async fn append_step(
        &self,
        project_id: i64,
        step_number: u32,
        title: &str,
        content: &str,
    ) -> StoreResult<StepRecord>;

    async fn get_website_summary(&self, project_id: i64) -> StoreResult<Option<WebsiteSummary>>;
    async fn upsert_website_summary(
        &self,
        project_id: i64,
        content: &str,
    ) -> StoreResult<WebsiteSummary>;

    /// Latest context recorded for `step_number`.
    async fn get_context(
        &self,
        project_id: i64,
        step_number: u32,
    ) -> StoreResult<Option<ContextRecord>>;
    async fn append_context(
        &self,
        project_id: i64,
        step_number: u32,
        context: &StepContext,
    ) -> StoreResult<ContextRecord>;

    /// Persist step, summary and context in one transaction.
    async fn record_step_run(&self, run: NewStepRun) -> StoreResult<RecordedStepRun>;
}

#[derive(Debug, Clone)]
pub struct SqliteAuditStore {
    db_path: PathBuf,
}

impl SqliteAuditStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn with_connection<T, F>(&self, func: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = open_connection(&db_path)?;
            func(&mut connection)
        })
        .await
        .map_err(|error| StoreError::Task(error.to_string()))?
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn init(&self) -> StoreResult<()> {
        log::info!("Initializing audit database at {:?}", self.db_path);
        self.with_connection(|connection| {
            connection.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS projects (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    website_url TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS steps (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id INTEGER NOT NULL,
                    step_number INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS website_summaries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id INTEGER NOT NULL UNIQUE,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS contexts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id INTEGER NOT NULL,
                    step_number INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_steps_project ON steps(project_id, step_number);
                CREATE INDEX IF NOT EXISTS idx_contexts_project ON contexts(project_id, step_number);
                "#,
            )?;
            Ok(())
        })
        .await
    }

    async fn create_project(&self, project: NewProject) -> StoreResult<Project> {
        self.with_connection(move |connection| insert_project(connection, &project, Utc::now()))
            .await
    }

    async fn get_project(&self, project_id: i64) -> StoreResult<Option<Project>> {
        self.with_connection(move |connection| load_project(connection, project_id))
            .await
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT id, name, website_url, created_at, updated_at FROM projects ORDER BY id",
            )?;
            let projects = statement
                .query_map([], project_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(projects)
        })
        .await
    }

    async fn get_step(
        &self,
        project_id: i64,
        step_number: u32,
    ) -> StoreResult<Option<StepRecord>> {
        self.with_connection(move |connection| {
            let step = connection
                .query_row(
                    r#"
                    SELECT id, project_id, step_number, title, content, created_at
                    FROM steps
                    WHERE project_id = ?1 AND step_number = ?2
                    ORDER BY id DESC
                    LIMIT 1
                    "#,
                    params![project_id, step_number],
                    step_from_row,
                )
                .optional()?;
            Ok(step)
        })
        .await
    }

    async fn list_steps(&self, project_id: i64) -> StoreResult<Vec<StepRecord>> {
        self.with_connection(move |connection| {
            let mut statement = connection.prepare(
                r#"
                SELECT id, project_id, step_number, title, content, created_at
                FROM steps
                WHERE project_id = ?1
                ORDER BY step_number, id
                "#,
            )?;
            let steps = statement
                .query_map(params![project_id], step_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(steps)
        })
        .await
    }

    async fn append_step(
        &self,
        project_id: i64,
        step_number: u32,
        title: &str,
        content: &str,
    ) -> StoreResult<StepRecord> {
        let title = title.to_string();
        let content = content.to_string();

        self.with_connection(move |connection| {
            ensure_project(connection, project_id)?;
            insert_step(
                connection,
                project_id,
                step_number,
                &title,
                &content,
                Utc::now(),
            )
        })
        .await
    }

    async fn get_website_summary(&self, project_id: i64) -> StoreResult<Option<WebsiteSummary>> {
        self.with_connection(move |connection| load_summary(connection, project_id))
            .await
    }

    async fn upsert_website_summary(
        &self,
        project_id: i64,
        content: &str,
    ) -> StoreResult<WebsiteSummary> {
        let content = content.to_string();

        self.with_connection(move |connection| {
            ensure_project(connection, project_id)?;
            upsert_summary(connection, project_id, &content, Utc::now())
        })
        .await
    }

    async fn get_context(
        &self,
        project_id: i64,
        step_number: u32,
    ) -> StoreResult<Option<ContextRecord>> {
        self.with_connection(move |connection| {
            let context = connection
                .query_row(
                    r#"
                    SELECT id, project_id, step_number, content, created_at
                    FROM contexts
                    WHERE project_id = ?1 AND step_number = ?2
                    ORDER BY id DESC
                    LIMIT 1
                    "#,
                    params![project_id, step_number],
                    context_from_row,
                )
                .optional()?;
            Ok(context)
        })
        .await
    }

    async fn append_context(
        &self,
        project_id: i64,
        step_number: u32,
        context: &StepContext,
    ) -> StoreResult<ContextRecord> {
        let context = context.clone();

        self.with_connection(move |connection| {
            ensure_project(connection, project_id)?;
            insert_context(connection, project_id, step_number, &context, Utc::now())
        })
        .await
    }

    async fn record_step_run(&self, run: NewStepRun) -> StoreResult<RecordedStepRun> {
        self.with_connection(move |connection| {
            let now = Utc::now();
            let transaction = connection.transaction()?;

            ensure_project(&transaction, run.project_id)?;
            let step = insert_step(
                &transaction,
                run.project_id,
                run.step_number,
                &run.title,
                &run.content,
                now,
            )?;
            let website_summary = match run.website_summary.as_deref() {
                Some(summary) => Some(upsert_summary(&transaction, run.project_id, summary, now)?),
                None => None,
            };
            let context =
                insert_context(&transaction, run.project_id, run.step_number, &run.context, now)?;

            transaction.commit()?;
            Ok(RecordedStepRun {
                step,
                website_summary,
                context,
            })
        })
        .await
    }
}

fn open_connection(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let connection = Connection::open(path)?;
    connection.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        "#,
    )?;
    Ok(connection)
}

fn insert_project(
    connection: &Connection,
    project: &NewProject,
    now: DateTime<Utc>,
) -> StoreResult<Project> {
    connection.execute(
        "INSERT INTO projects (name, website_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![project.name, project.website_url, now],
    )?;

    Ok(Project {
        id: connection.last_insert_rowid(),
        name: project.name.clone(),
        website_url: project.website_url.clone(),
        created_at: now,
        updated_at: now,
    })
}

fn load_project(connection: &Connection, project_id: i64) -> StoreResult<Option<Project>> {
    let project = connection
        .query_row(
            "SELECT id, name, website_url, created_at, updated_at FROM projects WHERE id = ?1",
            params![project_id],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

fn ensure_project(connection: &Connection, project_id: i64) -> StoreResult<()> {
    match load_project(connection, project_id)? {
        Some(_) => Ok(()),
        None => Err(StoreError::ProjectNotFound(project_id)),
    }
}

fn insert_step(
    connection: &Connection,
    project_id: i64,
    step_number: u32,
    title: &str,
    content: &str,
    now: DateTime<Utc>,
) -> StoreResult<StepRecord> {
    connection.execute(
        r#"
        INSERT INTO steps (project_id, step_number, title, content, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![project_id, step_number, title, content, now],
    )?;
    let id = connection.last_insert_rowid();

    connection.execute(
        "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
        params![now, project_id],
    )?;

    Ok(StepRecord {
        id,
        project_id,
        step_number,
        title: title.to_string(),
        content: content.to_string(),
        created_at: now,
    })
}

fn load_summary(connection: &Connection, project_id: i64) -> StoreResult<Option<WebsiteSummary>> {
    let summary = connection
        .query_row(
            r#"
            SELECT id, project_id, content, created_at, updated_at
            FROM website_summaries
            WHERE project_id = ?1
            "#,
            params![project_id],
            summary_from_row,
        )
        .optional()?;
    Ok(summary)
}

fn upsert_summary(
    connection: &Connection,
    project_id: i64,
    content: &str,
    now: DateTime<Utc>,
) -> StoreResult<WebsiteSummary> {
    connection.execute(
        r#"
        INSERT INTO website_summaries (project_id, content, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        ON CONFLICT(project_id) DO UPDATE SET
            content = excluded.content,
            updated_at = excluded.updated_at
        "#,
        params![project_id, content, now],
    )?;

    load_summary(connection, project_id)?
        .ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

fn insert_context(
    connection: &Connection,
    project_id: i64,
    step_number: u32,
    context: &StepContext,
    now: DateTime<Utc>,
) -> StoreResult<ContextRecord> {
    let content = serde_json::to_string(context)?;
    connection.execute(
        r#"
        INSERT INTO contexts (project_id, step_number, content, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![project_id, step_number, content, now],
    )?;

    Ok(ContextRecord {
        id: connection.last_insert_rowid(),
        project_id,
        step_number,
        content: context.clone(),
        created_at: now,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        website_url: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn step_from_row(row: &Row<'_>) -> rusqlite::Result<StepRecord> {
    Ok(StepRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        step_number: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<WebsiteSummary> {
    Ok(WebsiteSummary {
        id: row.get(0)?,
        project_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn context_from_row(row: &Row<'_>) -> rusqlite::Result<ContextRecord> {
    let raw: String = row.get(3)?;
    let content = serde_json::from_str::<StepContext>(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    Ok(ContextRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        step_number: row.get(2)?,
        content,
        created_at: row.get(4)?,
    })
}
