use thiserror::Error;
use serde::Serialize;

use axum::{
    Json,
    response::{IntoResponse, Response},
    http::StatusCode,
};

use crate::config::Mode;
use crate::email::MailError;
use crate::submission::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Mail,
    Records,
}

fn not_configured(subsystem: &Subsystem) -> &'static str {
    match subsystem {
        Subsystem::Mail => "Email service not configured",
        Subsystem::Records => "Applicant record store not configured",
    }
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{}", not_configured(.0))]
    NotConfigured(Subsystem),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Email already used")]
    Duplicate,
    #[error("Unable to verify previous applications, please try again later")]
    Infrastructure(anyhow::Error),
    #[error("Failed to render email")]
    Render(#[from] tera::Error),
    #[error(transparent)]
    Dispatch(#[from] MailError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApplyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApplyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApplyError::Validation(_) | ApplyError::Duplicate => StatusCode::BAD_REQUEST,
            ApplyError::NotConfigured(_)
            | ApplyError::Infrastructure(_)
            | ApplyError::Render(_)
            | ApplyError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApplyError::MethodNotAllowed | ApplyError::Duplicate | ApplyError::NotConfigured(_) => None,
            ApplyError::Validation(e) => Some(format!("{:?}", e)),
            ApplyError::Infrastructure(e) => Some(format!("{:?}", e)),
            ApplyError::Render(e) => Some(format!("{:?}", e)),
            ApplyError::Dispatch(e) => Some(format!("{:?}", e)),
        }
    }

    /// Diagnostic details are only attached in development mode.
    pub fn into_response_for(self, mode: Mode) -> Response {
        let details = match mode {
            Mode::Development => self.details(),
            Mode::Production => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                message: self.to_string(),
                details,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_outcomes_to_status_codes() {
        assert_eq!(ApplyError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApplyError::Duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApplyError::Validation(ValidationError::InvalidEmail).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApplyError::NotConfigured(Subsystem::Records).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApplyError::Infrastructure(anyhow::anyhow!("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn names_the_unconfigured_subsystem() {
        assert_eq!(
            ApplyError::NotConfigured(Subsystem::Mail).to_string(),
            "Email service not configured"
        );
        assert_eq!(
            ApplyError::NotConfigured(Subsystem::Records).to_string(),
            "Applicant record store not configured"
        );
    }

    #[test]
    fn dispatch_error_carries_provider_message() {
        let err = ApplyError::from(MailError::Rejected {
            status: 429,
            name: Some("rate_limit_exceeded".to_string()),
            message: "Too many requests".to_string(),
        });
        assert_eq!(err.to_string(), "Too many requests");
    }

    #[test]
    fn details_only_in_development() {
        let err = || ApplyError::Infrastructure(anyhow::anyhow!("connection refused"));

        assert!(err().details().unwrap().contains("connection refused"));

        let production = err().into_response_for(Mode::Production);
        assert_eq!(production.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
