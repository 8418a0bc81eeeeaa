//! Model lifecycle: loading → ready, plus process shutdown signals.
//!
//! The HTTP listener comes up before the model finishes loading so that
//! orchestrators can observe the `loading` state through `/healthz`.

pub mod cell;
pub mod loader;
pub mod shutdown;
pub mod types;


pub use cell::ModelCell;
pub use loader::spawn_model_loader;
pub use shutdown::shutdown_signal;
pub use types::ModelStatus;
