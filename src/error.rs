//! Error types
//!
//! The page pipeline itself never fails; these errors surface only where
//! external data is decoded (template payloads, config, FFI requests) and
//! where collaborators are called.

use thiserror::Error;
use uuid::Uuid;

use crate::model::Platform;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("template rule {id} is malformed: {reason}")]
    MalformedRule { id: i64, reason: String },

    #[error("invalid parser config: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[source] serde_json::Error),
}

/// Failure reported by a persistence collaborator
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to load templates for {platform}: {message}")]
    Templates { platform: Platform, message: String },

    #[error("failed to update status of operation {operation_id}: {message}")]
    Status { operation_id: Uuid, message: String },

    #[error("failed to save block for operation {operation_id}: {message}")]
    SaveBlock { operation_id: Uuid, message: String },
}
