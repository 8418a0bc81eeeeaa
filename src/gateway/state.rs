use std::sync::Arc;

use crate::gateway::payload::RequestLimits;
use crate::lifecycle::ModelCell;

/// Router state: the (possibly still loading) model and the request limits.
pub struct HandlerState<M> {
    pub model: Arc<ModelCell<M>>,

    pub limits: RequestLimits,
}

// Derived `Clone` would require `M: Clone`.
impl<M> Clone for HandlerState<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            limits: self.limits,
        }
    }
}

impl<M> HandlerState<M> {
    pub fn new(model: Arc<ModelCell<M>>, limits: RequestLimits) -> Self {
        Self { model, limits }
    }

    /// State around an already-loaded model.
    pub fn ready(model: M, limits: RequestLimits) -> Self {
        Self::new(Arc::new(ModelCell::ready(model)), limits)
    }
}
