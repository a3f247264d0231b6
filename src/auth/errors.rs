use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Classified failure of an auth action. Unclassified causes are logged and
/// collapsed into `Internal` with a fixed message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ActionError {
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::Unauthorized(_) => "UNAUTHORIZED",
            ActionError::Conflict(_) => "CONFLICT",
            ActionError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ActionError::Conflict(_) => StatusCode::CONFLICT,
            ActionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps an unexpected error to `Internal`, keeping the cause out of the reply.
pub(crate) fn internal(message: &'static str) -> impl FnOnce(anyhow::Error) -> ActionError {
    move |e| {
        error!(error = %e, "{}", message);
        ActionError::Internal(message.to_string())
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputIssue {
    pub path: String,
    pub message: String,
}

impl InputIssue {
    pub fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

/// Validation failure; raised before any action handler runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to validate: {}", join_messages(.issues))]
pub struct InputError {
    pub issues: Vec<InputIssue>,
}

fn join_messages(issues: &[InputIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Vec<InputIssue>> for InputError {
    fn from(issues: Vec<InputIssue>) -> Self {
        Self { issues }
    }
}

impl IntoResponse for InputError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": "BAD_REQUEST",
            "message": self.to_string(),
            "issues": self.issues,
        }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// Anything an action endpoint can reply with besides success.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Input(e) => e.into_response(),
            ApiError::Action(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses() {
        let cases = [
            (ActionError::Unauthorized("x".into()), "UNAUTHORIZED", 401),
            (ActionError::Conflict("x".into()), "CONFLICT", 409),
            (ActionError::Internal("x".into()), "INTERNAL_SERVER_ERROR", 500),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status().as_u16(), status);
        }
    }

    #[test]
    fn internal_hides_the_cause() {
        let err = internal("Error interno del servidor")(anyhow::anyhow!("connection refused"));
        assert_eq!(err, ActionError::Internal("Error interno del servidor".into()));
        assert!(!err.to_string().contains("connection refused"));
    }

    #[test]
    fn input_error_message_lists_issues() {
        let err = InputError::from(vec![
            InputIssue::new("email", "Email inválido"),
            InputIssue::new("password", "corta"),
        ]);
        assert_eq!(err.to_string(), "Failed to validate: Email inválido, corta");
    }
}
