pub mod admission;
pub mod conflict;
pub mod error;
pub mod events;
pub mod ids;
pub mod office_hour;
pub mod registration;
pub mod time;
