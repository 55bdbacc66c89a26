//! Group composer
//!
//! Keeps the material slots of a group draft in playback order. `sort` is
//! persisted and read by the screens, so after every mutation it must be
//! exactly `1..=N` in list order.

use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::entity::group::GroupMaterialDetail;
use crate::error::DraftError;

/// Accepted slot durations in seconds
pub const DURATION_RANGE: RangeInclusive<u32> = 1..=300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupComposer {
    details: Vec<GroupMaterialDetail>,
}

impl GroupComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from server data; entries are ordered by their stored sort
    /// and renumbered
    pub fn from_details(mut details: Vec<GroupMaterialDetail>) -> Self {
        details.sort_by_key(|d| d.sort);
        let mut composer = Self { details };
        composer.renumber();
        composer
    }

    pub fn details(&self) -> &[GroupMaterialDetail] {
        &self.details
    }

    pub fn into_details(self) -> Vec<GroupMaterialDetail> {
        self.details
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn contains(&self, material_id: i64) -> bool {
        self.details.iter().any(|d| d.material_id == material_id)
    }

    /// Length of one pass through the playlist
    pub fn total_seconds(&self) -> u32 {
        self.details.iter().map(|d| d.time).sum()
    }

    /// Append a material at the end of the playlist
    pub fn add(&mut self, material_id: Option<i64>, seconds: u32) -> Result<(), DraftError> {
        self.push_checked(material_id, seconds).map_err(|e| {
            warn!("Material slot rejected: {}", e);
            e
        })
    }

    fn push_checked(&mut self, material_id: Option<i64>, seconds: u32) -> Result<(), DraftError> {
        let material_id = material_id.ok_or(DraftError::MissingMaterial)?;
        if self.contains(material_id) {
            return Err(DraftError::DuplicateMaterial(material_id));
        }
        check_duration(seconds)?;

        let sort = self.next_sort();
        debug!("Adding material {} at position {} for {}s", material_id, sort, seconds);
        self.details
            .push(GroupMaterialDetail::new(material_id, sort, seconds));
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<GroupMaterialDetail, DraftError> {
        if index >= self.details.len() {
            return Err(DraftError::IndexOutOfRange(index));
        }
        let removed = self.details.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Swap with the neighbour. Moving past either end is a no-op.
    pub fn move_item(&mut self, index: usize, direction: Direction) -> Result<(), DraftError> {
        if index >= self.details.len() {
            return Err(DraftError::IndexOutOfRange(index));
        }
        let target = match direction {
            Direction::Up if index == 0 => return Ok(()),
            Direction::Up => index - 1,
            Direction::Down if index + 1 == self.details.len() => return Ok(()),
            Direction::Down => index + 1,
        };
        self.details.swap(index, target);
        self.renumber();
        Ok(())
    }

    /// Replace the slot duration; order is untouched
    pub fn set_duration(&mut self, index: usize, seconds: u32) -> Result<(), DraftError> {
        if let Err(e) = check_duration(seconds) {
            warn!("Duration change rejected: {}", e);
            return Err(e);
        }
        let detail = self
            .details
            .get_mut(index)
            .ok_or(DraftError::IndexOutOfRange(index))?;
        detail.time = seconds;
        Ok(())
    }

    fn next_sort(&self) -> u32 {
        self.details.len() as u32 + 1
    }

    fn renumber(&mut self) {
        for (position, detail) in self.details.iter_mut().enumerate() {
            detail.sort = position as u32 + 1;
        }
    }
}

fn check_duration(seconds: u32) -> Result<(), DraftError> {
    if DURATION_RANGE.contains(&seconds) {
        Ok(())
    } else {
        Err(DraftError::DurationOutOfRange(seconds))
    }
}
