use parking_lot::Mutex;
use pipeline_core::{PipelineError, PipelineResult, StageDeletePolicy};
use pipeline_domain::commands::{
    Command, DeleteOpportunity, DeleteStage, ReplaceOpportunity, ReplaceStage,
};
use pipeline_domain::{
    BoardView, DragTracker, Label, MutationScope, Note, NoteThread, Opportunity, OpportunityId,
    PipelineEvent, PipelineSnapshot, PipelineStore, RevertedMove, Stage, StageId,
};
use pipeline_remote::PipelineApi;
use std::future::Future;
use tokio::sync::broadcast;

use crate::BoardSettings;

const EVENT_BUFFER: usize = 64;

/// Store state captured around an optimistic change: right before it, and
/// right after it was applied.
pub(crate) struct Pending {
    before: PipelineSnapshot,
    applied: PipelineSnapshot,
    scope: MutationScope,
}

/// The sales pipeline board as the presentation layer sees it.
///
/// All methods take `&self` so several mutations can be in flight at
/// once. Locks are only held for the synchronous steps and never across a
/// remote call.
pub struct PipelineBoard<A: PipelineApi> {
    pub(crate) api: A,
    pub(crate) settings: BoardSettings,
    pub(crate) store: Mutex<PipelineStore>,
    pub(crate) drag: Mutex<DragTracker>,
    pub(crate) labels: Mutex<Vec<Label>>,
    events: broadcast::Sender<PipelineEvent>,
}

impl<A: PipelineApi> PipelineBoard<A> {
    pub fn new(api: A, settings: BoardSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            api,
            settings,
            store: Mutex::new(PipelineStore::new()),
            drag: Mutex::new(DragTracker::new()),
            labels: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Confirmed changes and rollbacks, in the order they were settled.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Replace stages and opportunities with the server's current lists.
    /// The open note thread is re-fetched, or closed if its opportunity is
    /// gone.
    pub async fn refresh(&self) -> PipelineResult<()> {
        let (stages, opportunities) = self
            .remote(async {
                futures::try_join!(self.api.fetch_stages(), self.api.fetch_opportunities())
            })
            .await?;

        let open_thread = {
            let mut store = self.store.lock();
            store.load_stages(stages);
            store.load_opportunities(opportunities);
            let open = store.thread().map(|t| t.opportunity_id);
            match open {
                Some(id) if store.opportunity(id).is_none() => {
                    store.close_thread();
                    None
                }
                other => other,
            }
        };

        if let Some(opportunity_id) = open_thread {
            let notes = self.remote(self.api.fetch_notes(opportunity_id)).await?;
            self.store.lock().load_notes(opportunity_id, notes);
        }

        tracing::info!("Board refreshed");
        Ok(())
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.store.lock().stages().into_iter().cloned().collect()
    }

    pub fn stage(&self, id: StageId) -> Option<Stage> {
        self.store.lock().stage(id).cloned()
    }

    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.store.lock().opportunities().to_vec()
    }

    pub fn opportunity(&self, id: OpportunityId) -> Option<Opportunity> {
        self.store.lock().opportunity(id).cloned()
    }

    pub fn opportunities_in_stage(&self, stage_id: StageId) -> Vec<Opportunity> {
        self.store
            .lock()
            .opportunities_in_stage(stage_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn thread(&self) -> Option<NoteThread> {
        self.store.lock().thread().cloned()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.store.lock().notes().to_vec()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.store.lock().snapshot()
    }

    pub fn view(&self) -> BoardView {
        let store = self.store.lock();
        let drag = self.drag.lock();
        BoardView::project(&store, &drag)
    }

    /// Snapshot, scope and optimistic apply in one critical section. The
    /// command is built from the store it will run against, so derived
    /// values like the next order position see every earlier optimistic
    /// change.
    pub(crate) fn apply_with<C, F>(&self, build: F) -> PipelineResult<(C, Pending)>
    where
        C: Command + 'static,
        F: FnOnce(&PipelineStore) -> PipelineResult<C>,
    {
        let mut store = self.store.lock();
        let command = build(&store)?;
        let before = store.snapshot();
        let scope = store.scope_of(&command);
        store.execute(&command)?;
        let applied = store.snapshot();
        Ok((
            command,
            Pending {
                before,
                applied,
                scope,
            },
        ))
    }

    pub(crate) fn apply<C: Command + 'static>(&self, command: C) -> PipelineResult<(C, Pending)> {
        self.apply_with(|_| Ok(command))
    }

    /// Bound a remote call by the configured timeout.
    pub(crate) async fn remote<T, F>(&self, call: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        let timeout = self.settings.request_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Transport(format!(
                "request timed out after {} ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Fold the server's copy of an entity into the store. A confirmation
    /// can lose a race with a later local delete of the same entity; that
    /// is not an error.
    pub(crate) fn confirm(&self, command: &dyn Command) {
        if let Err(e) = self.store.lock().execute(command) {
            tracing::debug!("Skipped confirmation '{}': {}", command.description(), e);
        }
    }

    /// Undo one optimistic change and report it. Returns the error so the
    /// caller can propagate it.
    ///
    /// Entities another mutation has changed since are not rolled back;
    /// the ones still on the board are re-read from the server instead.
    pub(crate) async fn revert(
        &self,
        pending: Pending,
        action: &str,
        error: PipelineError,
        restore_to: Option<RevertedMove>,
    ) -> PipelineError {
        let superseded = self.store.lock().restore_scoped(
            &pending.before,
            &pending.applied,
            &pending.scope,
        );
        tracing::warn!("{} failed, change reverted: {}", action, error);

        let restore_to = restore_to
            .filter(|moved| !superseded.opportunities.contains(&moved.opportunity_id));
        if !superseded.is_empty() {
            self.resync(&superseded).await;
        }

        self.emit(PipelineEvent::Reverted {
            action: action.to_string(),
            error: error.to_string(),
            restore_to,
        });
        error
    }

    /// Replace superseded stages and opportunities with the server's copy.
    /// Ones no longer in the store were deleted locally and are settled by
    /// that delete.
    async fn resync(&self, superseded: &MutationScope) {
        for &id in &superseded.opportunities {
            if self.opportunity(id).is_none() {
                continue;
            }
            match self.remote(self.api.fetch_opportunity(id)).await {
                Ok(opportunity) => self.confirm(&ReplaceOpportunity {
                    opportunity_id: id,
                    opportunity,
                }),
                Err(PipelineError::NotFound(_)) => {
                    self.confirm(&DeleteOpportunity { opportunity_id: id })
                }
                Err(e) => tracing::warn!("Could not re-read opportunity {}: {}", id, e),
            }
        }

        let stale: Vec<StageId> = superseded
            .stages
            .iter()
            .copied()
            .filter(|id| self.stage(*id).is_some())
            .collect();
        if stale.is_empty() {
            return;
        }
        match self.remote(self.api.fetch_stages()).await {
            Ok(stages) => {
                for id in stale {
                    match stages.iter().find(|s| s.id == id) {
                        Some(stage) => self.confirm(&ReplaceStage {
                            provisional_id: id,
                            stage: stage.clone(),
                        }),
                        None => self.confirm(&DeleteStage {
                            stage_id: id,
                            policy: StageDeletePolicy::Orphan,
                        }),
                    }
                }
            }
            Err(e) => tracing::warn!("Could not re-read stages: {}", e),
        }
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        let name = event.name();
        match self.events.send(event) {
            Ok(receivers) => tracing::debug!("Sent {} to {} subscribers", name, receivers),
            Err(_) => tracing::trace!("No subscribers for {}", name),
        }
    }
}
