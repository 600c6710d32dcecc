//! The machine-readable response envelope every external entry point on
//! the core wraps its result in (§6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::error_code::DrspecErrorCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrspecResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl<T> DrspecResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl DrspecErrorCode + std::fmt::Display) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: error.error_code().to_string(),
                message: error.to_string(),
                details: Value::Null,
            }),
        }
    }

    pub fn err_with_details(
        error: impl DrspecErrorCode + std::fmt::Display,
        details: Value,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: error.error_code().to_string(),
                message: error.to_string(),
                details,
            }),
        }
    }
}
