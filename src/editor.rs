//! Draft editor lifecycle
//!
//! ```text
//! Closed --open_new--> Editing --begin_submit--> Submitting --ok--> Closed
//!   |                    ^                           |
//!   +--begin_load--> Loading                         +--err--> Editing
//! ```
//!
//! Loads and saves are split into a `begin_*` call that hands out a ticket
//! and a `finish_*` call that applies the response. Every close bumps the
//! editor generation, so a response that arrives for an editor that has
//! since been closed is recognised by its ticket and never applied.

use tracing::{debug, info, warn};

use crate::client::ScreenApi;
use crate::draft::Draft;
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorState<D> {
    Closed,
    Loading { id: i64 },
    Editing { id: Option<i64>, draft: D },
    Submitting { id: Option<i64>, draft: D },
}

impl<D> EditorState<D> {
    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Closed => "closed",
            EditorState::Loading { .. } => "loading",
            EditorState::Editing { .. } => "editing",
            EditorState::Submitting { .. } => "submitting",
        }
    }
}

/// Issued by [`Editor::begin_load`]
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    id: i64,
}

impl LoadTicket {
    pub fn id(&self) -> i64 {
        self.id
    }
}

/// Issued by [`Editor::begin_submit`], carries the request to send
#[derive(Debug)]
pub struct SubmitTicket<R> {
    generation: u64,
    id: Option<i64>,
    request: R,
}

impl<R> SubmitTicket<R> {
    /// `None` for a new entity, the existing id for an update
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn request(&self) -> &R {
        &self.request
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Server accepted; the editor closed and the owning list should refresh
    Saved { id: i64 },
    /// Server or network refused; the draft is back in editing untouched
    Failed { message: String },
    /// The editor was closed while the request was in flight. The response
    /// was not applied; `persisted` tells whether the server kept the save.
    Stale { persisted: bool },
}

impl SubmitOutcome {
    /// Whether the list showing this entity type is now out of date
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Saved { .. } | SubmitOutcome::Stale { persisted: true }
        )
    }
}

#[derive(Debug)]
pub struct Editor<D: Draft> {
    state: EditorState<D>,
    generation: u64,
    last_error: Option<String>,
}

impl<D: Draft> Default for Editor<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Draft> Editor<D> {
    pub fn new() -> Self {
        Self {
            state: EditorState::Closed,
            generation: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> &EditorState<D> {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, EditorState::Closed)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditorState::Editing { .. })
    }

    /// Id of the entity being edited, `None` when creating
    pub fn entity_id(&self) -> Option<i64> {
        match &self.state {
            EditorState::Closed => None,
            EditorState::Loading { id } => Some(*id),
            EditorState::Editing { id, .. } | EditorState::Submitting { id, .. } => *id,
        }
    }

    /// The draft, readable while editing or submitting
    pub fn draft(&self) -> Option<&D> {
        match &self.state {
            EditorState::Editing { draft, .. } | EditorState::Submitting { draft, .. } => {
                Some(draft)
            }
            _ => None,
        }
    }

    /// The draft, writable only while editing
    pub fn draft_mut(&mut self) -> Option<&mut D> {
        match &mut self.state {
            EditorState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Message of the last failed load or save
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a new entity from `draft`
    pub fn open_new(&mut self, draft: D) -> AppResult<()> {
        self.require_closed()?;
        debug!("Opening new {} draft", D::KIND);
        self.last_error = None;
        self.state = EditorState::Editing { id: None, draft };
        Ok(())
    }

    pub fn begin_load(&mut self, id: i64) -> AppResult<LoadTicket> {
        self.require_closed()?;
        debug!("Loading {} {}", D::KIND, id);
        self.last_error = None;
        self.state = EditorState::Loading { id };
        Ok(LoadTicket {
            generation: self.generation,
            id,
        })
    }

    /// Apply a load response. Returns `Ok(false)` when the ticket is stale.
    ///
    /// A failed load closes the editor: there is nothing to edit without the
    /// source entity.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: AppResult<D>) -> AppResult<bool> {
        let current = matches!(self.state, EditorState::Loading { id } if id == ticket.id);
        if ticket.generation != self.generation || !current {
            warn!("Discarding stale load of {} {}", D::KIND, ticket.id);
            return Ok(false);
        }

        match result {
            Ok(draft) => {
                self.state = EditorState::Editing {
                    id: Some(ticket.id),
                    draft,
                };
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to load {} {}: {}", D::KIND, ticket.id, e);
                self.last_error = Some(e.user_message());
                self.reset();
                Err(e)
            }
        }
    }

    /// Fetch `id` from `api` and start editing it
    pub async fn load<A>(&mut self, api: &A, id: i64) -> AppResult<()>
    where
        A: ScreenApi<D> + ?Sized,
    {
        let ticket = self.begin_load(id)?;
        let result = api.fetch(id).await;
        self.finish_load(ticket, result)?;
        Ok(())
    }

    /// Validate and move to submitting. On validation failure the editor
    /// stays in editing and nothing is sent.
    pub fn begin_submit(&mut self) -> AppResult<SubmitTicket<D::Request>> {
        let (id, draft) = match std::mem::replace(&mut self.state, EditorState::Closed) {
            EditorState::Editing { id, draft } => (id, draft),
            other => {
                let name = other.name();
                self.state = other;
                return Err(AppError::InvalidState(name));
            }
        };

        if let Err(errors) = draft.validate() {
            debug!("{} draft failed validation: {}", D::KIND, errors);
            self.state = EditorState::Editing { id, draft };
            return Err(AppError::Validation(errors));
        }

        let request = draft.to_request();
        self.last_error = None;
        self.state = EditorState::Submitting { id, draft };
        Ok(SubmitTicket {
            generation: self.generation,
            id,
            request,
        })
    }

    /// Apply a save response; `result` carries the saved entity id
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket<D::Request>,
        result: AppResult<i64>,
    ) -> SubmitOutcome {
        let in_flight = matches!(self.state, EditorState::Submitting { .. });
        if ticket.generation != self.generation || !in_flight {
            let persisted = result.is_ok();
            warn!(
                "Discarding stale save of {} {:?} (persisted: {})",
                D::KIND,
                ticket.id,
                persisted
            );
            return SubmitOutcome::Stale { persisted };
        }

        match result {
            Ok(id) => {
                info!("Saved {} {}", D::KIND, id);
                self.reset();
                SubmitOutcome::Saved { id }
            }
            Err(e) => {
                let message = e.user_message();
                warn!("Saving {} failed: {}", D::KIND, e);
                if let EditorState::Submitting { id, draft } =
                    std::mem::replace(&mut self.state, EditorState::Closed)
                {
                    self.state = EditorState::Editing { id, draft };
                }
                self.last_error = Some(message.clone());
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Validate, send, and apply the response.
    ///
    /// `Err` is reserved for local problems (validation, wrong state); a
    /// refusal from the server comes back as [`SubmitOutcome::Failed`].
    pub async fn save<A>(&mut self, api: &A) -> AppResult<SubmitOutcome>
    where
        A: ScreenApi<D> + ?Sized,
    {
        let ticket = self.begin_submit()?;
        let result = match ticket.id() {
            Some(id) => api.update(id, ticket.request()).await.map(|()| id),
            None => api.create(ticket.request()).await,
        };
        Ok(self.finish_submit(ticket, result))
    }

    /// Discard the draft. Not allowed while a save is in flight.
    pub fn cancel(&mut self) -> AppResult<()> {
        if let EditorState::Submitting { .. } = self.state {
            return Err(AppError::InvalidState("submitting"));
        }
        if !self.is_closed() {
            debug!("Cancelled {} editor", D::KIND);
        }
        self.reset();
        Ok(())
    }

    /// Close unconditionally; an in-flight response will be discarded
    pub fn close(&mut self) {
        if let EditorState::Submitting { id, .. } = &self.state {
            warn!("Closing {} editor with save of {:?} in flight", D::KIND, id);
        }
        self.reset();
    }

    fn require_closed(&self) -> AppResult<()> {
        if self.is_closed() {
            Ok(())
        } else {
            Err(AppError::InvalidState(self.state.name()))
        }
    }

    fn reset(&mut self) {
        self.state = EditorState::Closed;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::draft::{GroupDraft, PlanDraft};
    use crate::entity::group::AddGroupRequest;
    use crate::entity::plan::AddPlanRequest;
    use crate::error::{DraftError, Field};

    /// In-memory store standing in for the backend
    #[derive(Default)]
    struct MemoryStore {
        groups: Mutex<HashMap<i64, AddGroupRequest>>,
        plans: Mutex<HashMap<i64, AddPlanRequest>>,
        next_id: Mutex<i64>,
        calls: Mutex<usize>,
        reject_with: Mutex<Option<String>>,
    }

    impl MemoryStore {
        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        fn reject(&self, message: Option<&str>) {
            *self.reject_with.lock().unwrap() = message.map(str::to_string);
        }

        fn gate(&self) -> AppResult<()> {
            *self.calls.lock().unwrap() += 1;
            match self.reject_with.lock().unwrap().clone() {
                Some(msg) => Err(AppError::Server {
                    status: 400,
                    message: Some(msg),
                }),
                None => Ok(()),
            }
        }

        fn next_id(&self) -> i64 {
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            *id
        }
    }

    #[async_trait]
    impl ScreenApi<GroupDraft> for MemoryStore {
        async fn fetch(&self, id: i64) -> AppResult<GroupDraft> {
            self.gate()?;
            let request = self.groups.lock().unwrap().get(&id).cloned();
            let request = request.ok_or_else(|| AppError::NotFound(format!("group {id}")))?;
            Ok(GroupDraft::from_request(request)?)
        }

        async fn create(&self, request: &AddGroupRequest) -> AppResult<i64> {
            self.gate()?;
            let id = self.next_id();
            self.groups.lock().unwrap().insert(id, request.clone());
            Ok(id)
        }

        async fn update(&self, id: i64, request: &AddGroupRequest) -> AppResult<()> {
            self.gate()?;
            self.groups.lock().unwrap().insert(id, request.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl ScreenApi<PlanDraft> for MemoryStore {
        async fn fetch(&self, id: i64) -> AppResult<PlanDraft> {
            self.gate()?;
            let request = self.plans.lock().unwrap().get(&id).cloned();
            let request = request.ok_or_else(|| AppError::NotFound(format!("plan {id}")))?;
            Ok(PlanDraft::from_request(request)?)
        }

        async fn create(&self, request: &AddPlanRequest) -> AppResult<i64> {
            self.gate()?;
            let id = self.next_id();
            self.plans.lock().unwrap().insert(id, request.clone());
            Ok(id)
        }

        async fn update(&self, id: i64, request: &AddPlanRequest) -> AppResult<()> {
            self.gate()?;
            self.plans.lock().unwrap().insert(id, request.clone());
            Ok(())
        }
    }

    fn group_draft() -> GroupDraft {
        let mut draft = GroupDraft::new();
        draft.name = "Lobby loop".to_string();
        draft.materials.add(Some(1), 10).unwrap();
        draft.materials.add(Some(2), 20).unwrap();
        draft
    }

    fn plan_draft() -> PlanDraft {
        let mut draft = PlanDraft::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        draft.name = "Launch week".to_string();
        draft.cabinets.insert("CAB001");
        draft
    }

    #[tokio::test]
    async fn test_create_then_reload_for_edit() {
        let store = MemoryStore::default();
        let mut editor = Editor::new();

        editor.open_new(group_draft()).unwrap();
        let outcome = editor.save(&store).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Saved { id: 1 });
        assert!(outcome.needs_refresh());
        assert!(editor.is_closed());

        editor.load(&store, 1).await.unwrap();
        assert_eq!(editor.entity_id(), Some(1));
        assert_eq!(editor.draft(), Some(&group_draft()));

        editor.draft_mut().unwrap().name = "Lobby loop v2".to_string();
        assert_eq!(
            editor.save(&store).await.unwrap(),
            SubmitOutcome::Saved { id: 1 }
        );
        assert_eq!(store.groups.lock().unwrap()[&1].name, "Lobby loop v2");
    }

    #[tokio::test]
    async fn test_validation_blocks_submit_without_network() {
        let store = MemoryStore::default();
        let mut editor: Editor<GroupDraft> = Editor::new();
        editor.open_new(GroupDraft::new()).unwrap();

        match editor.save(&store).await {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains(Field::Name));
                assert!(errors.contains(Field::Details));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(editor.is_editing());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_draft() {
        let store = MemoryStore::default();
        store.reject(Some("Name already used"));
        let mut editor = Editor::new();
        editor.open_new(group_draft()).unwrap();

        let outcome = editor.save(&store).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Name already used".to_string()
            }
        );
        assert!(!outcome.needs_refresh());
        assert!(editor.is_editing());
        assert_eq!(editor.draft(), Some(&group_draft()));
        assert_eq!(editor.last_error(), Some("Name already used"));

        // Retry after the server recovers
        store.reject(None);
        assert_eq!(
            editor.save(&store).await.unwrap(),
            SubmitOutcome::Saved { id: 1 }
        );
        assert!(editor.is_closed());
        assert!(editor.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_load_closes_editor() {
        let store = MemoryStore::default();
        let mut editor: Editor<PlanDraft> = Editor::new();
        let err = editor.load(&store, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(editor.is_closed());
        assert!(editor.last_error().is_some());
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut editor = Editor::new();
        editor.open_new(plan_draft()).unwrap();
        editor.draft_mut().unwrap().name.push_str(" (copy)");
        editor.cancel().unwrap();
        assert!(editor.is_closed());
        assert!(editor.draft().is_none());

        let ticket = editor.begin_load(5).unwrap();
        editor.cancel().unwrap();
        assert!(editor.is_closed());
        assert_eq!(editor.finish_load(ticket, Ok(plan_draft())).unwrap(), false);
        assert!(editor.is_closed());
    }

    #[test]
    fn test_open_requires_closed() {
        let mut editor = Editor::new();
        editor.open_new(plan_draft()).unwrap();
        assert!(matches!(
            editor.open_new(plan_draft()),
            Err(AppError::InvalidState("editing"))
        ));
        assert!(matches!(
            editor.begin_load(1),
            Err(AppError::InvalidState("editing"))
        ));
    }

    #[test]
    fn test_submitting_blocks_cancel_and_edits() {
        let mut draft = plan_draft();
        draft.schedule.add_hm(Some(1), (9, 0), (12, 0)).unwrap();
        let mut editor = Editor::new();
        editor.open_new(draft).unwrap();

        let ticket = editor.begin_submit().unwrap();
        assert_eq!(ticket.id(), None);
        assert_eq!(ticket.request().equipment_group.to_wire(), "CAB001");
        assert!(editor.draft_mut().is_none());
        assert!(editor.draft().is_some());
        assert!(matches!(
            editor.cancel(),
            Err(AppError::InvalidState("submitting"))
        ));
        assert!(matches!(
            editor.begin_submit(),
            Err(AppError::InvalidState("submitting"))
        ));

        assert_eq!(
            editor.finish_submit(ticket, Ok(9)),
            SubmitOutcome::Saved { id: 9 }
        );
        assert!(editor.is_closed());
    }

    #[test]
    fn test_response_after_close_is_stale() {
        let mut draft = plan_draft();
        draft.schedule.add_hm(Some(1), (9, 0), (12, 0)).unwrap();
        let mut editor = Editor::new();
        editor.open_new(draft.clone()).unwrap();

        let ticket = editor.begin_submit().unwrap();
        editor.close();
        assert!(editor.is_closed());

        let outcome = editor.finish_submit(ticket, Ok(3));
        assert_eq!(outcome, SubmitOutcome::Stale { persisted: true });
        assert!(outcome.needs_refresh());
        assert!(editor.is_closed());

        // A stale failure must not disturb a draft opened afterwards
        let mut draft = plan_draft();
        draft.schedule.add_hm(Some(2), (8, 0), (9, 0)).unwrap();
        editor.open_new(draft).unwrap();
        let old_ticket = editor.begin_submit().unwrap();
        editor.close();
        editor.open_new(plan_draft()).unwrap();
        let outcome = editor.finish_submit(old_ticket, Err(AppError::Rejected(None)));
        assert_eq!(outcome, SubmitOutcome::Stale { persisted: false });
        assert!(editor.is_editing());
        assert_eq!(editor.draft(), Some(&plan_draft()));
        assert!(editor.last_error().is_none());
    }

    #[test]
    fn test_plan_editor_end_to_end() {
        let store = MemoryStore::default();
        let mut editor = Editor::new();
        editor.open_new(plan_draft()).unwrap();

        let schedule = &mut editor.draft_mut().unwrap().schedule;
        schedule.add_hm(Some(1), (9, 0), (12, 0)).unwrap();
        assert!(matches!(
            schedule.add_hm(Some(1), (11, 0), (13, 0)),
            Err(DraftError::Overlap { .. })
        ));
        schedule.add_hm(Some(1), (12, 0), (13, 0)).unwrap();
        schedule.add_hm(Some(2), (9, 0), (12, 0)).unwrap();
        assert_eq!(schedule.len(), 3);

        let outcome = tokio_test::block_on(editor.save(&store)).unwrap();
        assert_eq!(outcome, SubmitOutcome::Saved { id: 1 });

        let stored = store.plans.lock().unwrap()[&1].clone();
        assert_eq!(stored.details.len(), 3);
        assert_eq!(stored.equipment_group.to_wire(), "CAB001");
    }
}
