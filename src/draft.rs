//! Editable drafts of groups and plans
//!
//! A draft is what an editor holds between opening and saving. It converts
//! to the create/update request on save and is hydrated from the detail
//! endpoint on load.

use chrono::NaiveDate;
use serde::Serialize;

use crate::composer::{GroupComposer, PlanScheduleComposer};
use crate::entity::cabinet::CabinetSet;
use crate::entity::group::{AddGroupRequest, GroupDetail};
use crate::entity::plan::{AddPlanRequest, PlanDetail};
use crate::error::{DraftError, Field, ValidationErrors};

/// Something an [`Editor`](crate::editor::Editor) can hold
pub trait Draft: Clone + Send + Sync + 'static {
    /// Body sent for both create and update
    type Request: Serialize + Clone + Send + Sync + 'static;

    /// Entity name used in logs and messages
    const KIND: &'static str;

    /// Form-level checks run before anything goes over the wire
    fn validate(&self) -> Result<(), ValidationErrors>;

    fn to_request(&self) -> Self::Request;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupDraft {
    pub name: String,
    pub materials: GroupComposer,
}

impl GroupDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a draft from a request body, replaying every slot through the
    /// composer so a hand-written file gets the same checks as interactive
    /// edits
    pub fn from_request(request: AddGroupRequest) -> Result<Self, DraftError> {
        let mut details = request.details;
        details.sort_by_key(|d| d.sort);

        let mut materials = GroupComposer::new();
        for detail in details {
            materials.add(Some(detail.material_id), detail.time)?;
        }
        Ok(Self {
            name: request.name,
            materials,
        })
    }
}

impl From<GroupDetail> for GroupDraft {
    fn from(detail: GroupDetail) -> Self {
        Self {
            name: detail.name,
            materials: GroupComposer::from_details(detail.details),
        }
    }
}

impl Draft for GroupDraft {
    type Request = AddGroupRequest;

    const KIND: &'static str = "group";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add(Field::Name, "Name is required");
        }
        if self.materials.is_empty() {
            errors.add(Field::Details, "Add at least one material");
        }
        errors.into_result()
    }

    fn to_request(&self) -> AddGroupRequest {
        AddGroupRequest {
            name: self.name.trim().to_string(),
            details: self.materials.details().to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cabinets: CabinetSet,
    pub schedule: PlanScheduleComposer,
}

impl PlanDraft {
    /// Empty plan running for the single day `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            start_date: today,
            end_date: today,
            cabinets: CabinetSet::new(),
            schedule: PlanScheduleComposer::new(),
        }
    }

    /// Empty plan starting and ending on the local date
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    /// Number of calendar days covered, both ends inclusive
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Whether `date` falls within the campaign
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Rebuild a draft from a request body, replaying every window through
    /// the overlap checker
    pub fn from_request(request: AddPlanRequest) -> Result<Self, DraftError> {
        let mut schedule = PlanScheduleComposer::new();
        for detail in request.details {
            schedule.add_hm(
                Some(detail.group_id),
                (detail.start_hour, detail.start_minute),
                (detail.end_hour, detail.end_minute),
            )?;
        }
        Ok(Self {
            name: request.plan_name,
            start_date: request.start_date,
            end_date: request.end_date,
            cabinets: request.equipment_group,
            schedule,
        })
    }
}

impl From<PlanDetail> for PlanDraft {
    fn from(detail: PlanDetail) -> Self {
        Self {
            name: detail.plan_name,
            start_date: detail.start_date,
            end_date: detail.end_date,
            cabinets: detail.equipment_group,
            schedule: PlanScheduleComposer::from_details(detail.details),
        }
    }
}

impl Draft for PlanDraft {
    type Request = AddPlanRequest;

    const KIND: &'static str = "plan";

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add(Field::Name, "Name is required");
        }
        if self.start_date > self.end_date {
            errors.add(Field::EndDate, "End date must not be before start date");
        }
        if self.cabinets.is_empty() {
            errors.add(Field::Cabinets, "Select at least one cabinet");
        }
        if self.schedule.is_empty() {
            errors.add(Field::Details, "Add at least one schedule");
        }
        errors.into_result()
    }

    fn to_request(&self) -> AddPlanRequest {
        AddPlanRequest {
            plan_name: self.name.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            equipment_group: self.cabinets.clone(),
            details: self.schedule.details().to_vec(),
        }
    }
}
