use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use officehours_core::events::DomainEvent;
use officehours_core::ids::{AccountId, CourseId, OfficeHourId, RegistrationId};
use officehours_core::office_hour::OfficeHourRule;
use officehours_core::registration::Registration;

use crate::error::PortError;

#[async_trait]
pub trait OfficeHourRepository: Send + Sync {
    /// Inserts or replaces the rule together with its host assignments.
    async fn save(&self, rule: &OfficeHourRule) -> Result<(), PortError>;
    async fn find_by_id(&self, id: &OfficeHourId) -> Result<Option<OfficeHourRule>, PortError>;
    async fn find_by_host(&self, host: &AccountId) -> Result<Vec<OfficeHourRule>, PortError>;
    async fn find_by_course(&self, course: &CourseId) -> Result<Vec<OfficeHourRule>, PortError>;
    /// Replaces the stored cancellation set; `NotFound` if the rule does not exist.
    async fn update_cancellations(
        &self,
        id: &OfficeHourId,
        dates: &BTreeSet<NaiveDate>,
    ) -> Result<(), PortError>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Must reject a second scheduled registration for the same rule, date and
    /// slot start with `PortError::Conflict`.
    async fn insert(&self, registration: &Registration) -> Result<(), PortError>;
    /// Stores `registration` as cancelled only if it is still scheduled.
    /// Returns `false` when another writer cancelled it first, `NotFound` if
    /// it does not exist.
    async fn mark_cancelled(&self, registration: &Registration) -> Result<bool, PortError>;
    async fn find_by_id(&self, id: &RegistrationId) -> Result<Option<Registration>, PortError>;
    async fn find_for_occurrence(
        &self,
        office_hour_id: &OfficeHourId,
        date: NaiveDate,
    ) -> Result<Vec<Registration>, PortError>;
    async fn find_by_account(&self, account: &AccountId) -> Result<Vec<Registration>, PortError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError>;
}
