use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::util::http::{internal_error, not_found};

/// Failure of one stage of the data path.
///
/// `NotFound` maps to 404; every other variant is a 500 whose `Display`
/// text becomes the request's error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    NotFound,
    Connection(String),
    Read(String),
    Prepare(String),
    Execution(String),
}

impl DataError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Connection(_) | Self::Read(_) | Self::Prepare(_) | Self::Execution(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Connection(detail) => write!(f, "Connection error: {detail}"),
            Self::Read(detail) => write!(f, "Read file error: {detail}"),
            Self::Prepare(detail) => write!(f, "Prepare error: {detail}"),
            Self::Execution(detail) => write!(f, "Query failed: {detail}"),
        }
    }
}

impl Error for DataError {}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => not_found(),
            other => internal_error(other.to_string()),
        }
    }
}
