use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::error::PermissionError;

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, "authorization backend failure");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
