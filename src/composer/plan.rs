//! Plan schedule composer
//!
//! Holds the (group, daily window) pairs of a plan draft. Two windows of the
//! same group may touch but never share a minute; different groups never
//! conflict with each other.

use tracing::warn;

use crate::entity::plan::{PlanScheduleDetail, TimeOfDay, TimeWindow};
use crate::error::DraftError;

/// Overlap test between a candidate `[start, end)` and an existing
/// `[d_start, d_end)`, all in minutes since midnight.
///
/// The three clauses catch a start inside the existing window, an end inside
/// it, and the candidate covering it entirely.
pub fn overlaps(start: u16, end: u16, d_start: u16, d_end: u16) -> bool {
    (start >= d_start && start < d_end)
        || (end > d_start && end <= d_end)
        || (start <= d_start && end >= d_end)
}

/// Index of the first same-group entry that conflicts with `window`
pub fn find_conflict(
    details: &[PlanScheduleDetail],
    group_id: i64,
    window: TimeWindow,
) -> Option<usize> {
    let start = window.start().total_minutes();
    let end = window.end().total_minutes();
    details.iter().position(|d| {
        d.group_id == group_id && overlaps(start, end, d.start_total(), d.end_total())
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanScheduleComposer {
    details: Vec<PlanScheduleDetail>,
}

impl PlanScheduleComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from server data as-is; the backend is the authority on what
    /// it already accepted
    pub fn from_details(details: Vec<PlanScheduleDetail>) -> Self {
        Self { details }
    }

    pub fn details(&self) -> &[PlanScheduleDetail] {
        &self.details
    }

    pub fn into_details(self) -> Vec<PlanScheduleDetail> {
        self.details
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Windows scheduled for one group, in insertion order
    pub fn windows_for(&self, group_id: i64) -> Vec<TimeWindow> {
        self.details
            .iter()
            .filter(|d| d.group_id == group_id)
            .filter_map(|d| d.window().ok())
            .collect()
    }

    /// Append a window for `group_id`; rejected when it shares a minute with
    /// another window of the same group
    pub fn add(
        &mut self,
        group_id: Option<i64>,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<(), DraftError> {
        self.push_checked(group_id, start, end).map_err(|e| {
            warn!(%start, %end, "Schedule entry rejected: {}", e);
            e
        })
    }

    fn push_checked(
        &mut self,
        group_id: Option<i64>,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<(), DraftError> {
        let group_id = group_id.ok_or(DraftError::MissingGroup)?;
        let window = TimeWindow::new(start, end)?;

        if let Some(existing) = find_conflict(&self.details, group_id, window) {
            return Err(DraftError::Overlap { group_id, existing });
        }

        self.details.push(PlanScheduleDetail::new(group_id, window));
        Ok(())
    }

    /// Convenience for callers holding raw hour/minute values
    pub fn add_hm(
        &mut self,
        group_id: Option<i64>,
        (start_hour, start_minute): (u8, u8),
        (end_hour, end_minute): (u8, u8),
    ) -> Result<(), DraftError> {
        let start = TimeOfDay::new(start_hour, start_minute)?;
        let end = TimeOfDay::new(end_hour, end_minute)?;
        self.add(group_id, start, end)
    }

    pub fn remove(&mut self, index: usize) -> Result<PlanScheduleDetail, DraftError> {
        if index >= self.details.len() {
            return Err(DraftError::IndexOutOfRange(index));
        }
        Ok(self.details.remove(index))
    }
}
