use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use officehours_core::admission::{admit, RegistrationRequest};
use officehours_core::error::DomainError;
use officehours_core::ids::{AccountId, OfficeHourId, RegistrationId};
use officehours_core::registration::{Actor, Registration};
use officehours_core::time::{parse_date, TimeOfDay, TimeWindow};
use officehours_ports::error::PortError;
use officehours_ports::inbound::RegistrationManager;
use officehours_ports::outbound::{EventPublisher, OfficeHourRepository, RegistrationRepository};
use officehours_ports::types::RawRegistration;

use crate::error::AppError;

pub struct RegistrationService<O, R, EP>
where
    O: OfficeHourRepository,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    office_hours: O,
    registrations: R,
    events: EP,
}

impl<O, R, EP> RegistrationService<O, R, EP>
where
    O: OfficeHourRepository,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    pub fn new(office_hours: O, registrations: R, events: EP) -> Self {
        Self {
            office_hours,
            registrations,
            events,
        }
    }

    pub async fn register(
        &self,
        office_hour_id: &str,
        raw: RawRegistration,
        now: DateTime<Utc>,
    ) -> Result<Registration, AppError> {
        let office_hour_id = OfficeHourId::parse(office_hour_id)?;
        let rule = self
            .office_hours
            .find_by_id(&office_hour_id)
            .await?
            .ok_or(AppError::Port(PortError::NotFound))?;
        let request = request_from_raw(raw)?;

        let existing = self
            .registrations
            .find_for_occurrence(rule.id(), request.date)
            .await?;
        let (registration, events) = admit(&rule, request, &existing, now).map_err(|e| {
            warn!(office_hour_id = %rule.id(), error = %e, "registration rejected");
            e
        })?;

        match self.registrations.insert(&registration).await {
            Ok(()) => {}
            Err(PortError::Conflict(detail)) => {
                warn!(
                    office_hour_id = %rule.id(),
                    date = %registration.date(),
                    detail = %detail,
                    "registration lost race for slot"
                );
                return Err(DomainError::SlotTaken.into());
            }
            Err(e) => return Err(e.into()),
        }
        self.events.publish(events).await?;

        info!(
            registration_id = %registration.id(),
            office_hour_id = %rule.id(),
            date = %registration.date(),
            start = %registration.slot().start(),
            "registration admitted"
        );
        Ok(registration)
    }

    /// Idempotent: cancelling a cancelled registration returns it unchanged.
    pub async fn cancel_registration(
        &self,
        registration_id: &str,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Registration, AppError> {
        let registration_id = RegistrationId::parse(registration_id)?;
        let mut registration = self
            .registrations
            .find_by_id(&registration_id)
            .await?
            .ok_or(AppError::Port(PortError::NotFound))?;

        let events = registration.cancel(&actor, now)?;
        if events.is_empty() {
            return Ok(registration);
        }
        if !self.registrations.mark_cancelled(&registration).await? {
            // a concurrent request cancelled it first; report what it stored
            warn!(registration_id = %registration.id(), "registration already cancelled");
            return self
                .registrations
                .find_by_id(&registration_id)
                .await?
                .ok_or(AppError::Port(PortError::NotFound));
        }
        self.events.publish(events).await?;
        info!(registration_id = %registration.id(), "registration cancelled");
        Ok(registration)
    }

    pub async fn list_for_account(&self, account_id: &str) -> Result<Vec<Registration>, AppError> {
        let account_id = AccountId::parse(account_id)?;
        Ok(self.registrations.find_by_account(&account_id).await?)
    }
}

fn request_from_raw(raw: RawRegistration) -> Result<RegistrationRequest, DomainError> {
    Ok(RegistrationRequest {
        account_id: AccountId::parse(&raw.account_id)?,
        date: parse_date(&raw.date)?,
        slot: TimeWindow::new(
            TimeOfDay::parse(&raw.start_time)?,
            TimeOfDay::parse(&raw.end_time)?,
        )?,
    })
}

#[async_trait]
impl<O, R, EP> RegistrationManager for RegistrationService<O, R, EP>
where
    O: OfficeHourRepository,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    type Error = AppError;

    async fn register(
        &self,
        office_hour_id: &str,
        raw: RawRegistration,
        now: DateTime<Utc>,
    ) -> Result<Registration, AppError> {
        RegistrationService::register(self, office_hour_id, raw, now).await
    }

    async fn cancel_registration(
        &self,
        registration_id: &str,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Registration, AppError> {
        RegistrationService::cancel_registration(self, registration_id, actor, now).await
    }

    async fn list_for_account(&self, account_id: &str) -> Result<Vec<Registration>, AppError> {
        RegistrationService::list_for_account(self, account_id).await
    }
}
