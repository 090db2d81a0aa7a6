//! Execution node and agent metric models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::node::MetricPoint;
use angus_core::types::{DbId, Timestamp};

/// A row from the `nodes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Node {
    pub id: DbId,
    pub tenant_id: DbId,
    pub name: String,
    pub ip: String,
    pub roles: Vec<String>,
    pub enabled: bool,
    pub cpu_cores: Option<i32>,
    pub memory_bytes: Option<i64>,
    pub disk_bytes: Option<i64>,
    pub agent_installed: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNode {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 2, max = 64))]
    pub ip: String,
    pub roles: Vec<String>,
    #[validate(range(min = 1))]
    pub cpu_cores: Option<i32>,
    #[validate(range(min = 0))]
    pub memory_bytes: Option<i64>,
    #[validate(range(min = 0))]
    pub disk_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNode {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 64))]
    pub ip: Option<String>,
    pub roles: Option<Vec<String>>,
    #[validate(range(min = 1))]
    pub cpu_cores: Option<i32>,
    #[validate(range(min = 0))]
    pub memory_bytes: Option<i64>,
    #[validate(range(min = 0))]
    pub disk_bytes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetNodeEnabled {
    pub enabled: bool,
}

/// A row from the `node_metrics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NodeMetric {
    pub id: DbId,
    pub node_id: DbId,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub network_rx_bytes: i64,
    pub network_tx_bytes: i64,
    pub sampled_at: Timestamp,
}

impl NodeMetric {
    pub fn point(&self) -> MetricPoint {
        MetricPoint {
            sampled_at: self.sampled_at,
            cpu_percent: self.cpu_percent,
            memory_percent: self.memory_percent,
            disk_percent: self.disk_percent,
        }
    }
}

/// A sample pushed by an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNodeMetric {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    #[serde(default)]
    pub network_rx_bytes: i64,
    #[serde(default)]
    pub network_tx_bytes: i64,
    /// Defaults to the time of receipt.
    pub sampled_at: Option<Timestamp>,
}

/// Query parameters for metric history.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsQuery {
    pub from: Timestamp,
    pub to: Timestamp,
    /// Bucket width for averaging; defaults to 60 seconds.
    pub bucket_secs: Option<i64>,
}
