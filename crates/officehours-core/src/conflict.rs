use serde::Serialize;

use crate::ids::OfficeHourId;
use crate::office_hour::OfficeHourRule;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictResult {
    pub has_conflict: bool,
    pub conflicting_rule_ids: Vec<OfficeHourId>,
}

/// Rule-level overlap test between two office hours sharing a host.
///
/// Compares date range, weekday set and daily window only; individual
/// cancelled dates are ignored, so this may report a collision that never
/// materializes but will not miss one that does.
pub fn rules_conflict(a: &OfficeHourRule, b: &OfficeHourRule) -> bool {
    a.shares_host_with(b)
        && a.date_range().overlaps(b.date_range())
        && a.weekdays().intersects(b.weekdays())
        && a.time_window().overlaps(b.time_window())
}

pub fn find_conflicts(proposed: &OfficeHourRule, existing: &[OfficeHourRule]) -> ConflictResult {
    let conflicting_rule_ids: Vec<OfficeHourId> = existing
        .iter()
        .filter(|rule| rule.id() != proposed.id())
        .filter(|rule| rules_conflict(proposed, rule))
        .map(|rule| rule.id().clone())
        .collect();
    ConflictResult {
        has_conflict: !conflicting_rule_ids.is_empty(),
        conflicting_rule_ids,
    }
}
