use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::ids::{AccountId, CourseId, OfficeHourId, RegistrationId};
use crate::time::TimeOfDay;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DomainEvent {
    OfficeHourCreated(OfficeHourCreated),
    OccurrenceCancelled(OccurrenceCancelled),
    RegistrationAdmitted(RegistrationAdmitted),
    RegistrationCancelled(RegistrationCancelled),
}

impl DomainEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::OfficeHourCreated(e) => e.occurred_at,
            Self::OccurrenceCancelled(e) => e.occurred_at,
            Self::RegistrationAdmitted(e) => e.occurred_at,
            Self::RegistrationCancelled(e) => e.occurred_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OfficeHourCreated(_) => "officehour.created",
            Self::OccurrenceCancelled(_) => "occurrence.cancelled",
            Self::RegistrationAdmitted(_) => "registration.admitted",
            Self::RegistrationCancelled(_) => "registration.cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficeHourCreated {
    pub office_hour_id: OfficeHourId,
    pub course_id: CourseId,
    pub hosts: Vec<AccountId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceCancelled {
    pub office_hour_id: OfficeHourId,
    pub date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationAdmitted {
    pub registration_id: RegistrationId,
    pub office_hour_id: OfficeHourId,
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationCancelled {
    pub registration_id: RegistrationId,
    pub office_hour_id: OfficeHourId,
    pub cancelled_by: AccountId,
    pub occurred_at: DateTime<Utc>,
}
