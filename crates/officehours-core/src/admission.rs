use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::DomainError;
use crate::events::{DomainEvent, RegistrationAdmitted};
use crate::ids::AccountId;
use crate::office_hour::OfficeHourRule;
use crate::registration::Registration;
use crate::time::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub slot: TimeWindow,
}

/// Decides whether `request` may be booked on `rule`.
///
/// Gates run in order and the first failure is returned: active occurrence,
/// slot inside the window, slot length and alignment to the slot grid, slot
/// free. `existing` should hold the registrations of this rule on the
/// requested date; cancelled ones are ignored.
/// A free slot here does not guarantee the write succeeds, the store's unique
/// index has the final word.
pub fn admit(
    rule: &OfficeHourRule,
    request: RegistrationRequest,
    existing: &[Registration],
    now: DateTime<Utc>,
) -> Result<(Registration, Vec<DomainEvent>), DomainError> {
    if !rule.produces_occurrence_on(request.date) {
        return Err(DomainError::InactiveOccurrence);
    }
    if !rule.time_window().contains(&request.slot) {
        return Err(DomainError::OutOfWindow);
    }
    let slot_length = Duration::minutes(i64::from(rule.slot_minutes()));
    let offset = rule
        .time_window()
        .start()
        .duration_until(&request.slot.start());
    if request.slot.duration() != slot_length
        || offset.num_seconds() % slot_length.num_seconds() != 0
    {
        return Err(DomainError::WrongInterval);
    }
    if existing
        .iter()
        .any(|r| r.occupies(rule.id(), request.date, request.slot.start()))
    {
        return Err(DomainError::SlotTaken);
    }

    let registration = Registration::scheduled(
        rule.id().clone(),
        request.account_id,
        request.date,
        request.slot,
        now,
    );
    let events = vec![DomainEvent::RegistrationAdmitted(RegistrationAdmitted {
        registration_id: registration.id().clone(),
        office_hour_id: rule.id().clone(),
        account_id: registration.account_id().clone(),
        date: registration.date(),
        start: registration.slot().start(),
        occurred_at: now,
    })];
    Ok((registration, events))
}
