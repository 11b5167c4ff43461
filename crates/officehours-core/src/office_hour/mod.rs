pub mod slot;

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{DomainEvent, OccurrenceCancelled, OfficeHourCreated};
use crate::ids::{AccountId, CourseId, OfficeHourId};
use crate::registration::Registration;
use crate::time::{weekday_of, DateRange, TimeWindow, WeekdaySet};

pub use slot::Slot;

/// Input for creating an office hour, already parsed into domain values.
#[derive(Debug, Clone)]
pub struct OfficeHourDraft {
    pub course_id: CourseId,
    pub hosts: Vec<AccountId>,
    pub time_window: TimeWindow,
    pub date_range: DateRange,
    pub weekdays: WeekdaySet,
    pub slot_minutes: u32,
    pub is_recurring: bool,
    pub location: Option<String>,
}

/// A host-defined block of bookable time, repeating on a set of weekdays
/// within a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeHourRule {
    id: OfficeHourId,
    course_id: CourseId,
    hosts: Vec<AccountId>,
    time_window: TimeWindow,
    date_range: DateRange,
    weekdays: WeekdaySet,
    slot_minutes: u32,
    is_recurring: bool,
    location: Option<String>,
    cancelled_dates: BTreeSet<NaiveDate>,
}

impl OfficeHourRule {
    pub fn new(
        draft: OfficeHourDraft,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<DomainEvent>), DomainError> {
        let mut hosts = draft.hosts;
        hosts.sort();
        hosts.dedup();
        if hosts.is_empty() {
            return Err(DomainError::RuleRequiresHost);
        }
        if draft.slot_minutes == 0
            || Duration::minutes(i64::from(draft.slot_minutes)) > draft.time_window.duration()
        {
            return Err(DomainError::InvalidSlotLength);
        }

        // A one-off office hour happens exactly once, on its start date.
        let (date_range, weekdays) = if draft.is_recurring {
            if draft.weekdays.is_empty() {
                return Err(DomainError::RuleRequiresWeekday);
            }
            (draft.date_range, draft.weekdays)
        } else {
            let day = draft.date_range.start();
            (DateRange::single(day), WeekdaySet::single(weekday_of(day)))
        };

        let rule = Self {
            id: OfficeHourId::new(),
            course_id: draft.course_id,
            hosts,
            time_window: draft.time_window,
            date_range,
            weekdays,
            slot_minutes: draft.slot_minutes,
            is_recurring: draft.is_recurring,
            location: draft.location,
            cancelled_dates: BTreeSet::new(),
        };
        let events = vec![DomainEvent::OfficeHourCreated(OfficeHourCreated {
            office_hour_id: rule.id.clone(),
            course_id: rule.course_id.clone(),
            hosts: rule.hosts.clone(),
            occurred_at: now,
        })];
        Ok((rule, events))
    }

    /// Whether the rule would take place on `date`, ignoring cancellations.
    fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        self.date_range.contains(date) && self.weekdays.contains(weekday_of(date))
    }

    pub fn produces_occurrence_on(&self, date: NaiveDate) -> bool {
        self.is_scheduled_on(date) && !self.cancelled_dates.contains(&date)
    }

    /// Bookable slots of the occurrence on `date`; empty when there is none.
    pub fn slots_on(&self, date: NaiveDate, existing: &[Registration]) -> Vec<Slot> {
        if !self.produces_occurrence_on(date) {
            return vec![];
        }
        slot::partition(&self.time_window, self.slot_minutes)
            .into_iter()
            .map(|(start, end)| {
                let taken = existing
                    .iter()
                    .any(|r| r.occupies(&self.id, date, start) && r.slot().end() == end);
                Slot {
                    start,
                    end,
                    available: !taken,
                }
            })
            .collect()
    }

    /// Occurrence dates in `[from, to]`, ascending.
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let first = from.max(self.date_range.start());
        let last = to.min(self.date_range.end());
        if first > last {
            return vec![];
        }
        first
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| self.produces_occurrence_on(*d))
            .collect()
    }

    pub fn add_cancellation(
        &mut self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        if !self.is_scheduled_on(date) {
            return Err(DomainError::InactiveOccurrence);
        }
        if !self.cancelled_dates.insert(date) {
            return Err(DomainError::AlreadyCancelled);
        }
        Ok(vec![DomainEvent::OccurrenceCancelled(OccurrenceCancelled {
            office_hour_id: self.id.clone(),
            date,
            occurred_at: now,
        })])
    }

    pub fn shares_host_with(&self, other: &OfficeHourRule) -> bool {
        self.hosts.iter().any(|h| other.hosts.contains(h))
    }

    pub fn id(&self) -> &OfficeHourId {
        &self.id
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    pub fn hosts(&self) -> &[AccountId] {
        &self.hosts
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn weekdays(&self) -> &WeekdaySet {
        &self.weekdays
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn cancelled_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.cancelled_dates
    }
}
