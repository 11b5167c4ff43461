use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use officehours_core::ids::OfficeHourId;
use officehours_core::office_hour::{OfficeHourRule, Slot};
use officehours_core::registration::{Actor, Registration};

use crate::types::{RawOfficeHour, RawRegistration};

#[async_trait]
pub trait OfficeHourManager: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn create_office_hour(
        &self,
        raw: RawOfficeHour,
        now: DateTime<Utc>,
    ) -> Result<OfficeHourId, Self::Error>;
    async fn get_office_hour(&self, id: &str) -> Result<OfficeHourRule, Self::Error>;
    async fn list_for_course(&self, course_id: &str) -> Result<Vec<OfficeHourRule>, Self::Error>;
    async fn occurrences(
        &self,
        id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<NaiveDate>, Self::Error>;
    async fn slots(&self, id: &str, date: &str) -> Result<Vec<Slot>, Self::Error>;
    async fn cancel_occurrence(
        &self,
        id: &str,
        date: &str,
        now: DateTime<Utc>,
    ) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait RegistrationManager: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn register(
        &self,
        office_hour_id: &str,
        raw: RawRegistration,
        now: DateTime<Utc>,
    ) -> Result<Registration, Self::Error>;
    async fn cancel_registration(
        &self,
        registration_id: &str,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Registration, Self::Error>;
    async fn list_for_account(&self, account_id: &str) -> Result<Vec<Registration>, Self::Error>;
}
