use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use officehours_core::conflict::find_conflicts;
use officehours_core::error::DomainError;
use officehours_core::ids::{AccountId, CourseId, OfficeHourId};
use officehours_core::office_hour::{OfficeHourDraft, OfficeHourRule, Slot};
use officehours_core::time::{
    parse_date, parse_weekday, DateRange, TimeOfDay, TimeWindow, WeekdaySet,
};
use officehours_ports::error::PortError;
use officehours_ports::inbound::OfficeHourManager;
use officehours_ports::outbound::{EventPublisher, OfficeHourRepository, RegistrationRepository};
use officehours_ports::types::RawOfficeHour;

use crate::error::AppError;
use crate::locks::KeyedLocks;

pub struct OfficeHourService<O, R, EP>
where
    O: OfficeHourRepository,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    office_hours: O,
    registrations: R,
    events: EP,
    host_locks: KeyedLocks<AccountId>,
    rule_locks: KeyedLocks<OfficeHourId>,
}

impl<O, R, EP> OfficeHourService<O, R, EP>
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
            host_locks: KeyedLocks::new(),
            rule_locks: KeyedLocks::new(),
        }
    }

    /// Creates the office hour unless it overlaps another office hour of one
    /// of its hosts.
    pub async fn create_office_hour(
        &self,
        raw: RawOfficeHour,
        now: DateTime<Utc>,
    ) -> Result<OfficeHourId, AppError> {
        let draft = draft_from_raw(raw)?;
        let (rule, events) = OfficeHourRule::new(draft, now)?;

        // held across fetch, check and save
        let _guards = self.host_locks.acquire(rule.hosts()).await;

        let mut existing: Vec<OfficeHourRule> = Vec::new();
        for host in rule.hosts() {
            for candidate in self.office_hours.find_by_host(host).await? {
                if !existing.iter().any(|r| r.id() == candidate.id()) {
                    existing.push(candidate);
                }
            }
        }
        debug!(
            office_hour_id = %rule.id(),
            candidates = existing.len(),
            "checking host conflicts"
        );

        let conflicts = find_conflicts(&rule, &existing);
        if conflicts.has_conflict {
            warn!(
                course_id = %rule.course_id(),
                conflicts = conflicts.conflicting_rule_ids.len(),
                "office hour rejected: host already booked"
            );
            return Err(AppError::HostConflict(conflicts));
        }

        let id = rule.id().clone();
        self.office_hours.save(&rule).await?;
        self.events.publish(events).await?;
        info!(office_hour_id = %id, course_id = %rule.course_id(), "office hour created");
        Ok(id)
    }

    pub async fn get_office_hour(&self, id: &str) -> Result<OfficeHourRule, AppError> {
        let id = OfficeHourId::parse(id)?;
        self.load(&id).await
    }

    pub async fn list_for_course(&self, course_id: &str) -> Result<Vec<OfficeHourRule>, AppError> {
        let course_id = CourseId::parse(course_id)?;
        Ok(self.office_hours.find_by_course(&course_id).await?)
    }

    pub async fn occurrences(
        &self,
        id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<NaiveDate>, AppError> {
        let rule = self.get_office_hour(id).await?;
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        Ok(rule.occurrences_between(from, to))
    }

    pub async fn slots(&self, id: &str, date: &str) -> Result<Vec<Slot>, AppError> {
        let rule = self.get_office_hour(id).await?;
        let date = parse_date(date)?;
        if !rule.produces_occurrence_on(date) {
            return Ok(vec![]);
        }
        let existing = self
            .registrations
            .find_for_occurrence(rule.id(), date)
            .await?;
        Ok(rule.slots_on(date, &existing))
    }

    /// Cancels a single occurrence. Registrations already made for that date
    /// are left for the caller to cancel.
    pub async fn cancel_occurrence(
        &self,
        id: &str,
        date: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let id = OfficeHourId::parse(id)?;
        let date = parse_date(date)?;

        let _guard = self.rule_locks.acquire(std::slice::from_ref(&id)).await;
        let mut rule = self.load(&id).await?;
        let events = rule.add_cancellation(date, now)?;
        self.office_hours
            .update_cancellations(rule.id(), rule.cancelled_dates())
            .await?;
        self.events.publish(events).await?;
        info!(office_hour_id = %id, %date, "occurrence cancelled");
        Ok(())
    }

    async fn load(&self, id: &OfficeHourId) -> Result<OfficeHourRule, AppError> {
        self.office_hours
            .find_by_id(id)
            .await?
            .ok_or(AppError::Port(PortError::NotFound))
    }
}

fn draft_from_raw(raw: RawOfficeHour) -> Result<OfficeHourDraft, DomainError> {
    let hosts = raw
        .hosts
        .iter()
        .map(|h| AccountId::parse(h))
        .collect::<Result<Vec<_>, _>>()?;
    let time_window = TimeWindow::new(
        TimeOfDay::parse(&raw.start_time)?,
        TimeOfDay::parse(&raw.end_time)?,
    )?;
    let start_date = parse_date(&raw.start_date)?;

    // a one-off office hour takes its day from the start date alone
    let (date_range, weekdays) = if raw.is_recurring {
        let end_date = match &raw.end_date {
            Some(end) => parse_date(end)?,
            None => start_date,
        };
        let weekdays = raw
            .days_of_week
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<Result<WeekdaySet, _>>()?;
        (DateRange::new(start_date, end_date)?, weekdays)
    } else {
        (DateRange::single(start_date), WeekdaySet::default())
    };

    Ok(OfficeHourDraft {
        course_id: CourseId::parse(&raw.course_id)?,
        hosts,
        time_window,
        date_range,
        weekdays,
        slot_minutes: raw.interval,
        is_recurring: raw.is_recurring,
        location: raw.location,
    })
}

#[async_trait]
impl<O, R, EP> OfficeHourManager for OfficeHourService<O, R, EP>
where
    O: OfficeHourRepository,
    R: RegistrationRepository,
    EP: EventPublisher,
{
    type Error = AppError;

    async fn create_office_hour(
        &self,
        raw: RawOfficeHour,
        now: DateTime<Utc>,
    ) -> Result<OfficeHourId, AppError> {
        OfficeHourService::create_office_hour(self, raw, now).await
    }

    async fn get_office_hour(&self, id: &str) -> Result<OfficeHourRule, AppError> {
        OfficeHourService::get_office_hour(self, id).await
    }

    async fn list_for_course(&self, course_id: &str) -> Result<Vec<OfficeHourRule>, AppError> {
        OfficeHourService::list_for_course(self, course_id).await
    }

    async fn occurrences(
        &self,
        id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<NaiveDate>, AppError> {
        OfficeHourService::occurrences(self, id, from, to).await
    }

    async fn slots(&self, id: &str, date: &str) -> Result<Vec<Slot>, AppError> {
        OfficeHourService::slots(self, id, date).await
    }

    async fn cancel_occurrence(
        &self,
        id: &str,
        date: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        OfficeHourService::cancel_occurrence(self, id, date, now).await
    }
}
