//! REST API handlers and shared response types

pub mod access_policy;
pub mod health;
pub mod metrics;
pub mod porting;

use serde::{Deserialize, Serialize};

/// Success envelope wrapping every JSON payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
