/// SQLite persistence layer for workflow runs
///
/// Runs are stored as JSON documents next to indexed status/date columns.
/// Every row carries an integer version; all mutations go through a
/// compare-and-swap on that version so concurrent webhook deliveries for
/// the same run serialize instead of overwriting each other.

use crate::runtime::types::WorkflowRun;
use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};

/// A run document together with the version it was read at
#[derive(Debug, Clone)]
pub struct VersionedRun {
    pub run: WorkflowRun,
    pub version: i64,
}

/// SQLite-based run storage with optimistic concurrency
#[derive(Debug, Clone)]
pub struct RunStorage {
    pool: SqlitePool,
}

impl RunStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the run storage schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                public_id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                status TEXT NOT NULL,
                document JSON NOT NULL,
                version INTEGER NOT NULL DEFAULT 0,
                date_started TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_runs_workflow
            ON runs(workflow_id, date_started)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a freshly materialized run at version 0
    pub async fn insert_run(&self, run: &WorkflowRun) -> Result<()> {
        let document = serde_json::to_string(run)?;

        sqlx::query(
            r#"
            INSERT INTO runs (public_id, workflow_id, status, document, version, date_started)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&run.public_id)
        .bind(&run.workflow_id)
        .bind(run.status.as_str())
        .bind(&document)
        .bind(run.date_started.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve a run document with its current version
    pub async fn get_run(&self, public_id: &str) -> Result<Option<VersionedRun>> {
        let row = sqlx::query("SELECT document, version FROM runs WHERE public_id = ?")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.get("document");
                let run: WorkflowRun = serde_json::from_str(&document)?;
                Ok(Some(VersionedRun {
                    run,
                    version: row.get("version"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Conditionally write a run document, keyed on the version it was read
    /// at. Returns false when another writer got there first; the caller
    /// reloads and recomputes.
    pub async fn try_update_run(&self, run: &WorkflowRun, expected_version: i64) -> Result<bool> {
        let document = serde_json::to_string(run)?;

        let result = sqlx::query(
            r#"
            UPDATE runs
            SET document = ?, status = ?, version = version + 1
            WHERE public_id = ? AND version = ?
            "#,
        )
        .bind(&document)
        .bind(run.status.as_str())
        .bind(&run.public_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply a mutation to a run under the compare-and-swap discipline,
    /// retrying on version conflicts until the write lands.
    pub async fn update_run<F>(&self, public_id: &str, mut apply: F) -> Result<WorkflowRun>
    where
        F: FnMut(&mut WorkflowRun),
    {
        loop {
            let versioned = self
                .get_run(public_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Run not found: {}", public_id))?;

            let mut run = versioned.run;
            apply(&mut run);

            if self.try_update_run(&run, versioned.version).await? {
                return Ok(run);
            }

            tracing::debug!("🔁 Version conflict updating run {}, retrying", public_id);
        }
    }

    /// List a workflow's runs, newest first, capped at 50
    pub async fn list_runs(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM runs
            WHERE workflow_id = ?
            ORDER BY date_started DESC
            LIMIT 50
            "#,
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await?;

        let mut runs = Vec::new();
        for row in rows {
            let document: String = row.get("document");
            runs.push(serde_json::from_str(&document)?);
        }

        Ok(runs)
    }
}
