use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{debug, warn};
use serde::Serialize;

use crate::mods::{ModError, Outcome};

/// Body of a successful mutation.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub result: Outcome,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    result: &'static str,
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

/// A [`ModError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ModError);

impl From<ModError> for ApiError {
    fn from(err: ModError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(ModError::Io(err))
    }
}

pub fn status_code(err: &ModError) -> StatusCode {
    match err {
        ModError::Config(_) | ModError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
        ModError::Privilege { .. } => StatusCode::FORBIDDEN,
        ModError::ModNotFound { .. } => StatusCode::NOT_FOUND,
        ModError::DuplicateName { .. }
        | ModError::SlotOccupied { .. }
        | ModError::NotASymlink { .. }
        | ModError::StaleTarget { .. } => StatusCode::CONFLICT,
        ModError::DirectoryUnreadable { .. } | ModError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        if status.is_server_error() {
            warn!("Request failed: {:#}", self.0);
        } else {
            debug!("Request rejected: {}", self.0);
        }

        let body = ErrorBody {
            result: "error",
            error: ErrorDetail {
                kind: self.0.kind(),
                message: format!("{:#}", self.0),
                hint: self.0.hint(),
            },
        };
        (status, Json(body)).into_response()
    }
}
