use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use officehours_core::ids::AccountId;
use officehours_core::registration::{Actor, Registration, RegistrationStatus};
use officehours_ports::types::RawRegistration;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub id: String,
    pub office_hour_id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&Registration> for RegistrationView {
    fn from(registration: &Registration) -> Self {
        Self {
            id: registration.id().to_string(),
            office_hour_id: registration.office_hour_id().to_string(),
            account_id: registration.account_id().to_string(),
            date: registration.date(),
            start_time: registration.slot().start().to_string(),
            end_time: registration.slot().end().to_string(),
            status: match registration.status() {
                RegistrationStatus::Scheduled => "scheduled",
                RegistrationStatus::Cancelled => "cancelled",
            },
            created_at: registration.created_at(),
            cancelled_at: registration.cancelled_at(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub account_id: String,
    pub role: Role,
}

impl CancelBody {
    fn actor(&self) -> Result<Actor, ApiError> {
        let account = AccountId::parse(&self.account_id)?;
        Ok(match self.role {
            Role::Student => Actor::Student(account),
            Role::Staff => Actor::Staff(account),
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    Path(office_hour_id): Path<String>,
    payload: Result<Json<RawRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationView>), ApiError> {
    let Json(raw) = payload?;
    let registration = state
        .registrations
        .register(&office_hour_id, raw, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(RegistrationView::from(&registration))))
}

pub async fn cancel_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<String>,
    payload: Result<Json<CancelBody>, JsonRejection>,
) -> Result<Json<RegistrationView>, ApiError> {
    let Json(body) = payload?;
    let actor = body.actor()?;
    let registration = state
        .registrations
        .cancel_registration(&registration_id, actor, Utc::now())
        .await?;
    Ok(Json(RegistrationView::from(&registration)))
}

pub async fn list_for_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<RegistrationView>>, ApiError> {
    let registrations = state.registrations.list_for_account(&account_id).await?;
    Ok(Json(registrations.iter().map(RegistrationView::from).collect()))
}
