//! Cross-cutting, shared constants.
//!
//! Request defaults mirror the public HTTP contract; limits are the fallbacks used
//! when the matching `DUET_*` variable is not set.

/// Instruction used when an embed request omits one.
pub const DEFAULT_INSTRUCTION: &str = "Represent the document for retrieval: ";

pub const DEFAULT_BATCH_SIZE: usize = 32;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 128;

pub const DEFAULT_MAX_INPUTS: usize = 2048;

pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Tokenizer truncation length shared by both models.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Instructor-XL output dimension after the dense projection.
pub const INSTRUCTOR_EMBEDDING_DIM: usize = 768;

pub const DEFAULT_PORT: u16 = 8080;

/// Response header carrying the coarse request outcome.
pub const DUET_STATUS_HEADER: &str = "x-duet-status";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const STATUS_OK: &str = "ok";
pub const STATUS_LOADING: &str = "loading";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_INVALID_REQUEST: &str = "invalid_request";
pub const STATUS_NOT_READY: &str = "not_ready";
pub const STATUS_INFERENCE_ERROR: &str = "inference_error";
pub const STATUS_INTERNAL_ERROR: &str = "internal_error";
