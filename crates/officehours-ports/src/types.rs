use serde::Deserialize;

/// Office hour as submitted by staff, before domain validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOfficeHour {
    pub course_id: String,
    pub hosts: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub start_date: String,
    /// Absent for a one-off office hour.
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub days_of_week: Vec<String>,
    /// Minutes per student.
    #[serde(alias = "slotLength")]
    pub interval: u32,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub location: Option<String>,
}

/// Registration as submitted by a student, before domain validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRegistration {
    pub account_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}
