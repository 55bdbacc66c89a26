//! Composers - in-memory editing of group playlists and plan schedules

pub mod group;
pub mod plan;

pub use group::{Direction, GroupComposer};
pub use plan::PlanScheduleComposer;
