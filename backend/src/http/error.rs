/// Request failure type and its mapping to HTTP responses
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::application::StoreError;
use crate::domain::DomainError;
use crate::infrastructure::rendering::{escape_html, RenderError};

/// Why a single request failed. Never takes the process down
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// The page store failed, timed out or is gone
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    /// A request parameter was missing or malformed
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The view could not be rendered
    #[error("Rendering failure: {0}")]
    Render(#[from] RenderError),
}

/// Result type for request handlers
pub type WikiResult<T> = Result<T, WikiError>;

impl From<DomainError> for WikiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue(message) => WikiError::Validation(message),
            storage @ DomainError::Storage(_) => WikiError::Storage(StoreError::Repository(storage)),
        }
    }
}

impl WikiError {
    fn status(&self) -> StatusCode {
        match self {
            WikiError::Validation(_) => StatusCode::BAD_REQUEST,
            WikiError::Storage(_) | WikiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            WikiError::Validation(message) => message.clone(),
            // Backend details stay in the log
            WikiError::Storage(_) | WikiError::Render(_) => "Internal Server Error".to_string(),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = format!(
            "<!DOCTYPE html>\n<html>\n<body>\n<h1>{}</h1>\n<p>{}</p>\n</body>\n</html>\n",
            status.as_u16(),
            escape_html(&message)
        );
        (status, Html(body)).into_response()
    }
}
