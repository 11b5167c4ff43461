use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{DomainEvent, RegistrationCancelled};
use crate::ids::{AccountId, OfficeHourId, RegistrationId};
use crate::time::{TimeOfDay, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Scheduled,
    Cancelled,
}

/// Who is acting on a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Student(AccountId),
    Staff(AccountId),
}

impl Actor {
    pub fn account_id(&self) -> &AccountId {
        match self {
            Self::Student(id) | Self::Staff(id) => id,
        }
    }
}

/// A student's claim on one slot of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    id: RegistrationId,
    office_hour_id: OfficeHourId,
    account_id: AccountId,
    date: NaiveDate,
    slot: TimeWindow,
    status: RegistrationStatus,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// Only the admission checker creates registrations.
    pub(crate) fn scheduled(
        office_hour_id: OfficeHourId,
        account_id: AccountId,
        date: NaiveDate,
        slot: TimeWindow,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RegistrationId::new(),
            office_hour_id,
            account_id,
            date,
            slot,
            status: RegistrationStatus::Scheduled,
            created_at: now,
            cancelled_at: None,
        }
    }

    /// Cancelling an already cancelled registration is a no-op.
    pub fn cancel(
        &mut self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        if let Actor::Student(account) = actor {
            if account != &self.account_id {
                return Err(DomainError::NotPermitted);
            }
        }
        if self.status == RegistrationStatus::Cancelled {
            return Ok(vec![]);
        }
        self.status = RegistrationStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(vec![DomainEvent::RegistrationCancelled(
            RegistrationCancelled {
                registration_id: self.id.clone(),
                office_hour_id: self.office_hour_id.clone(),
                cancelled_by: actor.account_id().clone(),
                occurred_at: now,
            },
        )])
    }

    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Scheduled
    }

    /// True when this registration holds the slot starting at `start` on that occurrence.
    pub fn occupies(
        &self,
        office_hour_id: &OfficeHourId,
        date: NaiveDate,
        start: TimeOfDay,
    ) -> bool {
        self.is_active()
            && &self.office_hour_id == office_hour_id
            && self.date == date
            && self.slot.start() == start
    }

    pub fn id(&self) -> &RegistrationId {
        &self.id
    }

    pub fn office_hour_id(&self) -> &OfficeHourId {
        &self.office_hour_id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn slot(&self) -> TimeWindow {
        self.slot
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }
}
