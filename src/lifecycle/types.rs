use chrono::{DateTime, Utc};

use crate::constants::{STATUS_FAILED, STATUS_LOADING, STATUS_OK};

/// Snapshot of a [`ModelCell`](super::ModelCell) without the model itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loading,
    Ready { since: DateTime<Utc> },
    Failed { reason: String },
}

impl ModelStatus {
    /// Value reported in the `status` field of `/healthz`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::Loading => STATUS_LOADING,
            ModelStatus::Ready { .. } => STATUS_OK,
            ModelStatus::Failed { .. } => STATUS_FAILED,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready { .. })
    }
}
