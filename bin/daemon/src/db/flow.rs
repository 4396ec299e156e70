//! Database repository for flow documents.
//!
//! Flows persist as one row each, with nodes, edges, settings, and stats
//! stored as JSONB documents. The whole document is rewritten on every
//! save; the engine's bookkeeping touches stats often and flows stay small.

use chrono::{DateTime, Utc};
use crosswire_core::{FlowId, UserId};
use crosswire_flow::{Edge, Flow, FlowSettings, FlowStats, Node};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::decode_error;

/// Row type for flow queries.
#[derive(FromRow)]
struct FlowRow {
    id: String,
    user_id: String,
    name: String,
    description: Option<String>,
    nodes: serde_json::Value,
    edges: serde_json::Value,
    settings: serde_json::Value,
    stats: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FlowRow {
    fn try_into_flow(self) -> Result<Flow, sqlx::Error> {
        let id = FlowId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid flow id '{}': {}", self.id, e)))?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {}", self.user_id, e)))?;
        let nodes: Vec<Node> = serde_json::from_value(self.nodes)
            .map_err(|e| decode_error(format!("invalid nodes for flow '{}': {}", self.id, e)))?;
        let edges: Vec<Edge> = serde_json::from_value(self.edges)
            .map_err(|e| decode_error(format!("invalid edges for flow '{}': {}", self.id, e)))?;
        let settings: FlowSettings = serde_json::from_value(self.settings)
            .map_err(|e| decode_error(format!("invalid settings for flow '{}': {}", self.id, e)))?;
        let stats: FlowStats = serde_json::from_value(self.stats)
            .map_err(|e| decode_error(format!("invalid stats for flow '{}': {}", self.id, e)))?;

        Ok(Flow {
            id,
            user_id,
            name: self.name,
            description: self.description,
            nodes,
            edges,
            settings,
            stats,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for flow operations.
pub struct FlowRepository {
    pool: PgPool,
}

impl FlowRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every flow marked active in its settings document.
    pub async fn find_active(&self) -> Result<Vec<Flow>, sqlx::Error> {
        let rows: Vec<FlowRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, description, nodes, edges, settings, stats,
                   created_at, updated_at
            FROM flows
            WHERE (settings ->> 'is_active')::boolean = TRUE
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into_flow()).collect()
    }

    /// Finds a flow by ID.
    pub async fn find_by_id(&self, id: FlowId) -> Result<Option<Flow>, sqlx::Error> {
        let row: Option<FlowRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, description, nodes, edges, settings, stats,
                   created_at, updated_at
            FROM flows
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_flow()?)),
            None => Ok(None),
        }
    }

    /// Inserts or replaces a flow.
    pub async fn upsert(&self, flow: &Flow) -> Result<(), sqlx::Error> {
        let nodes = serde_json::to_value(&flow.nodes).unwrap_or_default();
        let edges = serde_json::to_value(&flow.edges).unwrap_or_default();
        let settings = serde_json::to_value(&flow.settings).unwrap_or_default();
        let stats = serde_json::to_value(&flow.stats).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO flows
                (id, user_id, name, description, nodes, edges, settings, stats,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id)
            DO UPDATE SET name = $3, description = $4, nodes = $5, edges = $6,
                          settings = $7, stats = $8, updated_at = $10
            "#,
        )
        .bind(flow.id.to_string())
        .bind(flow.user_id.to_string())
        .bind(&flow.name)
        .bind(&flow.description)
        .bind(&nodes)
        .bind(&edges)
        .bind(&settings)
        .bind(&stats)
        .bind(flow.created_at)
        .bind(flow.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a flow. Returns whether a row existed.
    pub async fn delete(&self, id: FlowId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM flows
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
