use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

use crate::db::DynError;

/// Errors surfaced by HTTP handlers
///
/// Everything except a missing submission is reported with HTTP 200 and
/// `{"success": false, "message": ...}` so the admin UI can show the message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Submission {0} not found")]
    SubmissionNotFound(i64),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{context}: {source}")]
    Failed {
        context: &'static str,
        #[source]
        source: DynError,
    },
}

impl AppError {
    /// Wrap any error with the endpoint's message prefix, for use with `map_err`
    pub fn failed<E>(context: &'static str) -> impl FnOnce(E) -> AppError
    where
        E: Into<DynError>,
    {
        move |err| AppError::Failed {
            context,
            source: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::SubmissionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingFields(_) => {
                warn!("{}", self);
                StatusCode::OK
            }
            AppError::Failed { .. } => {
                error!("{}", self);
                StatusCode::OK
            }
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
