//! Shared response envelope types for API handlers.
//!
//! Reads use `{ "data": ... }`; writes add the confirmation message shown to
//! the user as `{ "message": ..., "data": ... }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "message": ..., "data": T }` returned by create and update handlers.
#[derive(Debug, Serialize)]
pub struct FlashResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> FlashResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// `{ "message": ... }` returned by delete handlers and cache maintenance.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
