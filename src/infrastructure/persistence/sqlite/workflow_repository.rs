//! SQLite Workflow Repository Implementation
//!
//! Workflows span three tables: the workflow row, its ordered criteria
//! and its target links. Saves replace all three in one transaction.

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

use super::media_repository::parse_uuid;
use crate::domain::entities::{Combine, Criterion, CriterionKey, CriterionOp, Workflow};
use crate::domain::repositories::WorkflowRepository;
use crate::shared::error::RepositoryError;

pub struct SqliteWorkflowRepository {
    pool: Pool<Sqlite>,
}

impl SqliteWorkflowRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn load_criteria(&self, workflow_id: Uuid) -> Result<Vec<Criterion>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT combine, key, op, value FROM workflow_criteria \
             WHERE workflow_id = ? ORDER BY position",
        )
        .bind(workflow_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut criteria = Vec::with_capacity(rows.len());
        for row in rows {
            criteria.push(Criterion {
                combine: Combine::from_str(row.try_get("combine")?)?,
                key: CriterionKey::from_str(row.try_get("key")?)?,
                op: CriterionOp::from_str(row.try_get("op")?)?,
                value: row.try_get("value")?,
            });
        }
        Ok(criteria)
    }

    async fn load_target_ids(&self, workflow_id: Uuid) -> Result<Vec<Uuid>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT target_id FROM workflow_targets WHERE workflow_id = ? ORDER BY target_id",
        )
        .bind(workflow_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_uuid(row.try_get("target_id")?))
            .collect()
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Workflow, RepositoryError> {
        let id = parse_uuid(row.try_get("id")?)?;
        Ok(Workflow {
            id,
            label: row.try_get("label")?,
            enabled: row.try_get::<i64, _>("enabled")? != 0,
            criteria: self.load_criteria(id).await?,
            target_ids: self.load_target_ids(id).await?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl WorkflowRepository for SqliteWorkflowRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM workflows ORDER BY label")
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(self.hydrate(&row).await?);
        }
        Ok(result)
    }

    async fn list_enabled(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM workflows WHERE enabled = 1 ORDER BY label")
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(self.hydrate(&row).await?);
        }
        Ok(result)
    }

    async fn save(&self, workflow: &Workflow) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let id = workflow.id.to_string();

        sqlx::query(
            "INSERT INTO workflows (id, label, enabled, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET label = excluded.label, \
             enabled = excluded.enabled, updated_at = excluded.updated_at",
        )
        .bind(&id)
        .bind(&workflow.label)
        .bind(workflow.enabled as i64)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM workflow_criteria WHERE workflow_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        for (position, criterion) in workflow.criteria.iter().enumerate() {
            sqlx::query(
                "INSERT INTO workflow_criteria (workflow_id, position, combine, key, op, value) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(position as i64)
            .bind(criterion.combine.as_str())
            .bind(criterion.key.as_str())
            .bind(criterion.op.as_str())
            .bind(&criterion.value)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM workflow_targets WHERE workflow_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        for target_id in &workflow.target_ids {
            sqlx::query("INSERT INTO workflow_targets (workflow_id, target_id) VALUES (?, ?)")
                .bind(&id)
                .bind(target_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
