use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid time of day: {0}")]
    InvalidTime(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid weekday: {0}")]
    InvalidWeekday(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("time window must start before it ends")]
    InvalidTimeWindow,
    #[error("date range must not end before it starts")]
    InvalidDateRange,
    #[error("slot length must be positive and fit inside the time window")]
    InvalidSlotLength,
    #[error("office hour requires at least one host")]
    RuleRequiresHost,
    #[error("recurring office hour requires at least one weekday")]
    RuleRequiresWeekday,
    #[error("office hour does not take place on this date")]
    InactiveOccurrence,
    #[error("requested slot lies outside the office hour window")]
    OutOfWindow,
    #[error("requested slot does not match the office hour interval")]
    WrongInterval,
    #[error("requested slot is already taken")]
    SlotTaken,
    #[error("office hour is already cancelled on this date")]
    AlreadyCancelled,
    #[error("actor may not modify this registration")]
    NotPermitted,
}
