//! Synthetic storage operations attributed to agent executions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::BoundedLedger;

/// SQL verb of a data operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataOperationKind {
    Insert,
    Select,
    Update,
    Delete,
}

impl DataOperationKind {
    pub const ALL: [DataOperationKind; 4] = [
        DataOperationKind::Select,
        DataOperationKind::Insert,
        DataOperationKind::Update,
        DataOperationKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataOperationKind::Insert => "INSERT",
            DataOperationKind::Select => "SELECT",
            DataOperationKind::Update => "UPDATE",
            DataOperationKind::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for DataOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One storage operation performed by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOperation {
    pub id: Uuid,
    pub table: String,
    pub operation: DataOperationKind,
    pub records_affected: u64,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
}

impl DataOperation {
    pub fn new(
        agent: impl Into<String>,
        table: impl Into<String>,
        operation: DataOperationKind,
        records_affected: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            table: table.into(),
            operation,
            records_affected,
            timestamp,
            agent: agent.into(),
        }
    }
}

/// Append-only, capacity-bounded log of data operations
#[derive(Debug, Clone)]
pub struct DataOperationLog {
    inner: BoundedLedger<DataOperation>,
    total_recorded: u64,
}

impl DataOperationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedLedger::new(capacity),
            total_recorded: 0,
        }
    }

    pub fn record(&mut self, op: DataOperation) {
        self.total_recorded += 1;
        self.inner.push(op);
    }

    /// Up to `limit` operations, most-recent-first
    pub fn snapshot(&self, limit: Option<usize>) -> Vec<DataOperation> {
        self.inner.snapshot(limit)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Operations recorded since start, including evicted ones
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataOperation> {
        self.inner.iter()
    }
}
