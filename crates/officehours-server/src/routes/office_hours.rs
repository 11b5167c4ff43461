use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use officehours_core::office_hour::{OfficeHourRule, Slot};
use officehours_core::time::weekday_name;
use officehours_ports::types::RawOfficeHour;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeHourView {
    pub id: String,
    pub course_id: String,
    pub hosts: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_of_week: Vec<&'static str>,
    pub interval: u32,
    pub is_recurring: bool,
    pub location: Option<String>,
    pub cancelled_dates: Vec<NaiveDate>,
}

impl From<&OfficeHourRule> for OfficeHourView {
    fn from(rule: &OfficeHourRule) -> Self {
        Self {
            id: rule.id().to_string(),
            course_id: rule.course_id().to_string(),
            hosts: rule.hosts().iter().map(ToString::to_string).collect(),
            start_time: rule.time_window().start().to_string(),
            end_time: rule.time_window().end().to_string(),
            start_date: rule.date_range().start(),
            end_date: rule.date_range().end(),
            days_of_week: rule.weekdays().iter().map(weekday_name).collect(),
            interval: rule.slot_minutes(),
            is_recurring: rule.is_recurring(),
            location: rule.location().map(str::to_string),
            cancelled_dates: rule.cancelled_dates().iter().copied().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OccurrenceQuery {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct CancellationBody {
    pub date: String,
}

pub async fn create_office_hour(
    State(state): State<AppState>,
    payload: Result<Json<RawOfficeHour>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(raw) = payload?;
    let id = state.office_hours.create_office_hour(raw, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id.to_string() }))))
}

pub async fn get_office_hour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OfficeHourView>, ApiError> {
    let rule = state.office_hours.get_office_hour(&id).await?;
    Ok(Json(OfficeHourView::from(&rule)))
}

pub async fn list_for_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<OfficeHourView>>, ApiError> {
    let rules = state.office_hours.list_for_course(&course_id).await?;
    Ok(Json(rules.iter().map(OfficeHourView::from).collect()))
}

pub async fn occurrences(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<OccurrenceQuery>, QueryRejection>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
    let Query(range) = query?;
    let dates = state
        .office_hours
        .occurrences(&id, &range.from, &range.to)
        .await?;
    Ok(Json(dates))
}

pub async fn slots(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<SlotQuery>, QueryRejection>,
) -> Result<Json<Vec<Slot>>, ApiError> {
    let Query(query) = query?;
    let slots = state.office_hours.slots(&id, &query.date).await?;
    Ok(Json(slots))
}

pub async fn cancel_occurrence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CancellationBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload?;
    state
        .office_hours
        .cancel_occurrence(&id, &body.date, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
