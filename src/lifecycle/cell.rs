use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::types::ModelStatus;

enum ModelState<M> {
    Loading,
    Ready { model: Arc<M>, since: DateTime<Utc> },
    Failed { reason: String },
}

/// Holds the served model once it has loaded.
///
/// Transitions are one-way: `Loading` → `Ready` or `Loading` → `Failed`.
/// Later transitions are ignored.
pub struct ModelCell<M> {
    state: RwLock<ModelState<M>>,
}

impl<M> std::fmt::Debug for ModelCell<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCell")
            .field("status", &self.status())
            .finish()
    }
}

impl<M> Default for ModelCell<M> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<M> ModelCell<M> {
    /// Creates an empty cell in the `Loading` state.
    pub fn loading() -> Self {
        Self {
            state: RwLock::new(ModelState::Loading),
        }
    }

    /// Creates a cell that is already `Ready` (tests, eager startup).
    pub fn ready(model: M) -> Self {
        Self {
            state: RwLock::new(ModelState::Ready {
                model: Arc::new(model),
                since: Utc::now(),
            }),
        }
    }

    /// Moves `Loading` → `Ready`. Returns `false` if the cell had already settled.
    pub fn set_ready(&self, model: M) -> bool {
        let mut state = self.state.write();
        if !matches!(*state, ModelState::Loading) {
            return false;
        }
        *state = ModelState::Ready {
            model: Arc::new(model),
            since: Utc::now(),
        };
        true
    }

    /// Moves `Loading` → `Failed`. Returns `false` if the cell had already settled.
    pub fn set_failed(&self, reason: impl Into<String>) -> bool {
        let mut state = self.state.write();
        if !matches!(*state, ModelState::Loading) {
            return false;
        }
        *state = ModelState::Failed {
            reason: reason.into(),
        };
        true
    }

    /// Returns the model if it is ready.
    pub fn get(&self) -> Option<Arc<M>> {
        match &*self.state.read() {
            ModelState::Ready { model, .. } => Some(Arc::clone(model)),
            _ => None,
        }
    }

    pub fn status(&self) -> ModelStatus {
        match &*self.state.read() {
            ModelState::Loading => ModelStatus::Loading,
            ModelState::Ready { since, .. } => ModelStatus::Ready { since: *since },
            ModelState::Failed { reason } => ModelStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), ModelState::Ready { .. })
    }
}
