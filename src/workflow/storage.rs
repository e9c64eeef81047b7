/// SQLite persistence layer for workflow definitions
///
/// Workflows are stored as JSON documents for flexibility while keeping
/// indexed lookup columns for listing.

use crate::workflow::types::Workflow;
use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};

/// SQLite-based workflow storage
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    pool: SqlitePool,
}

impl WorkflowStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the workflow storage schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                public_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                document JSON NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_workflows_created
            ON workflows(created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new workflow or replace an existing document
    pub async fn save_workflow(&self, workflow: &Workflow) -> Result<()> {
        let document = serde_json::to_string(workflow)?;

        sqlx::query(
            r#"
            INSERT INTO workflows (public_id, name, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(public_id) DO UPDATE SET
                name = excluded.name,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&workflow.public_id)
        .bind(&workflow.name)
        .bind(&document)
        .bind(workflow.created_at.to_rfc3339())
        .bind(workflow.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve a workflow by public id
    pub async fn get_workflow(&self, public_id: &str) -> Result<Option<Workflow>> {
        let row = sqlx::query("SELECT document FROM workflows WHERE public_id = ?")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.get("document");
                let workflow: Workflow = serde_json::from_str(&document)?;
                Ok(Some(workflow))
            }
            None => Ok(None),
        }
    }

    /// List workflow metadata, newest first
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        let rows = sqlx::query(
            "SELECT public_id, name, created_at, updated_at FROM workflows ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut workflows = Vec::new();
        for row in rows {
            workflows.push(WorkflowMetadata {
                public_id: row.get("public_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(workflows)
    }
}

/// Basic workflow metadata for listing operations
#[derive(Debug, serde::Serialize)]
pub struct WorkflowMetadata {
    pub public_id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}
