use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use officehours_app::error::AppError;
use officehours_core::error::DomainError;
use officehours_ports::error::PortError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::App(AppError::Domain(e))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::App(AppError::HostConflict(_)) => StatusCode::CONFLICT,
            Self::App(AppError::Port(e)) => match e {
                PortError::NotFound => StatusCode::NOT_FOUND,
                PortError::Conflict(_) => StatusCode::CONFLICT,
                PortError::Persistence(_) | PortError::Connection(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::App(AppError::Domain(e)) => match e {
                DomainError::SlotTaken | DomainError::AlreadyCancelled => StatusCode::CONFLICT,
                DomainError::NotPermitted => StatusCode::FORBIDDEN,
                DomainError::InvalidTime(_)
                | DomainError::InvalidDate(_)
                | DomainError::InvalidWeekday(_)
                | DomainError::InvalidId(_)
                | DomainError::InvalidTimeWindow
                | DomainError::InvalidDateRange
                | DomainError::InvalidSlotLength
                | DomainError::RuleRequiresHost
                | DomainError::RuleRequiresWeekday
                | DomainError::InactiveOccurrence
                | DomainError::OutOfWindow
                | DomainError::WrongInterval => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BadRequest",
            Self::App(AppError::HostConflict(_)) => "HostConflict",
            Self::App(AppError::Port(e)) => match e {
                PortError::NotFound => "NotFound",
                PortError::Conflict(_) => "Conflict",
                PortError::Persistence(_) => "Persistence",
                PortError::Connection(_) => "Connection",
            },
            Self::App(AppError::Domain(e)) => match e {
                DomainError::InvalidTime(_) => "InvalidTime",
                DomainError::InvalidDate(_) => "InvalidDate",
                DomainError::InvalidWeekday(_) => "InvalidWeekday",
                DomainError::InvalidId(_) => "InvalidId",
                DomainError::InvalidTimeWindow => "InvalidTimeWindow",
                DomainError::InvalidDateRange => "InvalidDateRange",
                DomainError::InvalidSlotLength => "InvalidSlotLength",
                DomainError::RuleRequiresHost => "RuleRequiresHost",
                DomainError::RuleRequiresWeekday => "RuleRequiresWeekday",
                DomainError::InactiveOccurrence => "InactiveOccurrence",
                DomainError::OutOfWindow => "OutOfWindow",
                DomainError::WrongInterval => "WrongInterval",
                DomainError::SlotTaken => "SlotTaken",
                DomainError::AlreadyCancelled => "AlreadyCancelled",
                DomainError::NotPermitted => "NotPermitted",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut error = json!({
            "message": self.to_string(),
            "kind": self.kind(),
        });
        if let Self::App(AppError::HostConflict(result)) = &self {
            let ids: Vec<String> = result
                .conflicting_rule_ids
                .iter()
                .map(ToString::to_string)
                .collect();
            error["conflictingRuleIds"] = json!(ids);
        }

        let body = Json(json!({
            "success": false,
            "error": error,
        }));

        (status, body).into_response()
    }
}
