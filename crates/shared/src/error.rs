use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ControlField;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A control value outside the domain known to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid value '{value}' for {field}")]
    InvalidFilterValue { field: ControlField, value: String },
}

impl FilterError {
    pub fn invalid(field: ControlField, value: impl ToString) -> Self {
        FilterError::InvalidFilterValue {
            field,
            value: value.to_string(),
        }
    }

    pub fn field(&self) -> ControlField {
        match self {
            FilterError::InvalidFilterValue { field, .. } => *field,
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(value: FilterError) -> Self {
        Self {
            code: ErrorCode::Validation,
            message: value.to_string(),
        }
    }
}
