//! In-memory projection of the board between server round-trips.
//!
//! The store never talks to the network. Loads replace collections
//! wholesale; everything else goes through a [`Command`].

use crate::commands::{Command, CommandContext};
use crate::{
    sorted_stages, MutationScope, Note, NoteThread, Opportunity, OpportunityId, PipelineSnapshot,
    Stage, StageId,
};
use pipeline_core::PipelineResult;

#[derive(Debug, Clone, Default)]
pub struct PipelineStore {
    stages: Vec<Stage>,
    opportunities: Vec<Opportunity>,
    thread: Option<NoteThread>,
}

impl PipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_stages(&mut self, stages: Vec<Stage>) {
        tracing::debug!("Loaded {} stages", stages.len());
        self.stages = stages;
    }

    pub fn load_opportunities(&mut self, opportunities: Vec<Opportunity>) {
        tracing::debug!("Loaded {} opportunities", opportunities.len());
        self.opportunities = opportunities;
    }

    /// Make `opportunity_id`'s notes the open thread, oldest first.
    pub fn load_notes(&mut self, opportunity_id: OpportunityId, notes: Vec<Note>) {
        self.thread = Some(NoteThread::new(opportunity_id, notes));
    }

    pub fn close_thread(&mut self) {
        self.thread = None;
    }

    /// Stages in board order.
    pub fn stages(&self) -> Vec<&Stage> {
        sorted_stages(&self.stages)
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// The stage new opportunities land in: the one with the lowest position.
    pub fn entry_stage(&self) -> Option<&Stage> {
        self.stages().into_iter().next()
    }

    pub fn next_order_position(&self) -> PipelineResult<i32> {
        crate::next_order_position(&self.stages)
    }

    pub fn opportunities(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn opportunity(&self, id: OpportunityId) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    pub fn opportunities_in_stage(&self, stage_id: StageId) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.stage_id == stage_id)
            .collect()
    }

    /// Opportunities whose stage no longer exists. Only non-empty after an
    /// orphaning stage delete, until they are moved.
    pub fn orphaned_opportunities(&self) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| self.stage(o.stage_id).is_none())
            .collect()
    }

    pub fn thread(&self) -> Option<&NoteThread> {
        self.thread.as_ref()
    }

    pub fn notes(&self) -> &[Note] {
        self.thread.as_ref().map(|t| t.notes()).unwrap_or(&[])
    }

    /// Entities `command` would touch if executed now.
    pub fn scope_of(&mut self, command: &dyn Command) -> MutationScope {
        let context = self.context();
        command.scope(&context)
    }

    pub fn execute(&mut self, command: &dyn Command) -> PipelineResult<()> {
        tracing::debug!("Executing: {}", command.description());
        let mut context = self.context();
        command.execute(&mut context)
    }

    fn context(&mut self) -> CommandContext<'_> {
        CommandContext {
            stages: &mut self.stages,
            opportunities: &mut self.opportunities,
            thread: &mut self.thread,
        }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            stages: self.stages.clone(),
            opportunities: self.opportunities.clone(),
            thread: self.thread.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: PipelineSnapshot) {
        self.stages = snapshot.stages;
        self.opportunities = snapshot.opportunities;
        self.thread = snapshot.thread;
    }

    /// Put back the entities named in `scope` as they were in `before`,
    /// but only those still exactly as the mutation left them (`applied`).
    /// An entity that a later mutation has changed or removed since is left
    /// alone and returned in the superseded scope.
    ///
    /// Entities absent from `before` are removed, entities missing from the
    /// store are re-inserted at their old index.
    pub fn restore_scoped(
        &mut self,
        before: &PipelineSnapshot,
        applied: &PipelineSnapshot,
        scope: &MutationScope,
    ) -> MutationScope {
        let mut superseded = MutationScope::new();
        superseded.stages = restore_entities(
            &mut self.stages,
            &before.stages,
            &applied.stages,
            &scope.stages,
            |s| s.id,
        );
        superseded.opportunities = restore_entities(
            &mut self.opportunities,
            &before.opportunities,
            &applied.opportunities,
            &scope.opportunities,
            |o| o.id,
        );

        if scope.thread {
            if self.thread == applied.thread {
                self.thread = before.thread.clone();
            } else {
                superseded.thread = true;
            }
        } else if !scope.notes.is_empty() {
            match (self.thread.as_mut(), before.thread.as_ref(), applied.thread.as_ref()) {
                (Some(current), Some(saved), Some(ours))
                    if saved.opportunity_id == current.opportunity_id
                        && ours.opportunity_id == current.opportunity_id =>
                {
                    superseded.notes = restore_entities(
                        current.notes_mut(),
                        saved.notes(),
                        ours.notes(),
                        &scope.notes,
                        |n| n.id,
                    );
                }
                _ => tracing::debug!("Open note thread changed, notes left as is"),
            }
        }

        superseded
    }
}

fn restore_entities<T, K, F>(
    current: &mut Vec<T>,
    before: &[T],
    applied: &[T],
    ids: &[K],
    key: F,
) -> Vec<K>
where
    T: Clone + PartialEq,
    K: Copy + PartialEq,
    F: Fn(&T) -> K,
{
    let position = |list: &[T], id: K| list.iter().position(|e| key(e) == id);

    let mut superseded = Vec::new();
    let mut reinsert = Vec::new();
    for &id in ids {
        let now = position(current.as_slice(), id);
        let unchanged = match (now, position(applied, id)) {
            (Some(c), Some(a)) => current[c] == applied[a],
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            superseded.push(id);
            continue;
        }

        match (position(before, id), now) {
            (Some(b), Some(c)) => current[c] = before[b].clone(),
            (Some(b), None) => reinsert.push(b),
            (None, Some(c)) => {
                current.remove(c);
            }
            (None, None) => {}
        }
    }

    reinsert.sort_unstable();
    for b in reinsert {
        let at = b.min(current.len());
        current.insert(at, before[b].clone());
    }
    superseded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::*;
    use crate::OpportunityDraft;
    use pipeline_core::StageDeletePolicy;

    fn board() -> (PipelineStore, StageId, StageId) {
        let novo = Stage::new("Novo".to_string(), 1);
        let fechado = Stage::new("Fechado".to_string(), 2);
        let (novo_id, fechado_id) = (novo.id, fechado.id);
        let mut store = PipelineStore::new();
        store.load_stages(vec![fechado, novo]);
        (store, novo_id, fechado_id)
    }

    fn add(store: &mut PipelineStore, title: &str, stage_id: StageId) -> OpportunityId {
        let opportunity = Opportunity::new(OpportunityDraft::new(title), stage_id);
        let id = opportunity.id;
        store
            .execute(&CreateOpportunity { opportunity })
            .unwrap();
        id
    }

    #[test]
    fn test_stages_are_ordered() {
        let (store, novo, _) = board();
        let names: Vec<_> = store.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Novo", "Fechado"]);
        assert_eq!(store.entry_stage().map(|s| s.id), Some(novo));
        assert_eq!(store.next_order_position().unwrap(), 3);
    }

    #[test]
    fn test_opportunities_in_stage_after_move() {
        let (mut store, novo, fechado) = board();
        let a = add(&mut store, "A", novo);
        let b = add(&mut store, "B", novo);

        store
            .execute(&MoveOpportunity {
                opportunity_id: a,
                target_stage_id: fechado,
            })
            .unwrap();

        let in_novo: Vec<_> = store.opportunities_in_stage(novo).iter().map(|o| o.id).collect();
        let in_fechado: Vec<_> = store
            .opportunities_in_stage(fechado)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(in_novo, vec![b]);
        assert_eq!(in_fechado, vec![a]);
    }

    #[test]
    fn test_failed_command_leaves_store_untouched() {
        let (mut store, novo, _) = board();
        add(&mut store, "A", novo);
        let before = store.snapshot();

        let result = store.execute(&MoveOpportunity {
            opportunity_id: uuid::Uuid::new_v4(),
            target_stage_id: novo,
        });
        assert!(result.is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let (mut store, novo, fechado) = board();
        let a = add(&mut store, "A", novo);
        let before = store.snapshot();

        store
            .execute(&MoveOpportunity {
                opportunity_id: a,
                target_stage_id: fechado,
            })
            .unwrap();
        store
            .execute(&RenameStage {
                stage_id: novo,
                name: "Entrada".to_string(),
            })
            .unwrap();
        assert_ne!(store.snapshot(), before);

        store.restore(before.clone());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_scoped_restore_reinserts_at_original_index() {
        let (mut store, novo, _) = board();
        add(&mut store, "A", novo);
        let b = add(&mut store, "B", novo);
        add(&mut store, "C", novo);
        let before = store.snapshot();

        let command = DeleteOpportunity { opportunity_id: b };
        let scope = store.scope_of(&command);
        store.execute(&command).unwrap();
        let applied = store.snapshot();

        let superseded = store.restore_scoped(&before, &applied, &scope);
        assert!(superseded.is_empty());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_scoped_restore_keeps_unrelated_changes() {
        let (mut store, novo, fechado) = board();
        let a = add(&mut store, "A", novo);
        let b = add(&mut store, "B", novo);

        let before_first = store.snapshot();
        let first = MoveOpportunity {
            opportunity_id: a,
            target_stage_id: fechado,
        };
        let first_scope = store.scope_of(&first);
        store.execute(&first).unwrap();
        let first_applied = store.snapshot();

        store
            .execute(&MoveOpportunity {
                opportunity_id: b,
                target_stage_id: fechado,
            })
            .unwrap();

        store.restore_scoped(&before_first, &first_applied, &first_scope);
        assert_eq!(store.opportunity(a).unwrap().stage_id, novo);
        assert_eq!(store.opportunity(b).unwrap().stage_id, fechado);
    }

    #[test]
    fn test_scoped_restore_leaves_later_delete_alone() {
        let (mut store, novo, fechado) = board();
        let a = add(&mut store, "A", novo);

        let before = store.snapshot();
        let moved = MoveOpportunity {
            opportunity_id: a,
            target_stage_id: fechado,
        };
        let scope = store.scope_of(&moved);
        store.execute(&moved).unwrap();
        let applied = store.snapshot();

        store
            .execute(&DeleteOpportunity { opportunity_id: a })
            .unwrap();

        let superseded = store.restore_scoped(&before, &applied, &scope);
        assert!(store.opportunity(a).is_none());
        assert_eq!(superseded.opportunities, vec![a]);
    }

    #[test]
    fn test_scoped_restore_leaves_later_edit_alone() {
        let (mut store, novo, fechado) = board();
        let a = add(&mut store, "A", novo);

        let before = store.snapshot();
        let moved = MoveOpportunity {
            opportunity_id: a,
            target_stage_id: fechado,
        };
        let scope = store.scope_of(&moved);
        store.execute(&moved).unwrap();
        let applied = store.snapshot();

        let mut fields = store.opportunity(a).unwrap().fields();
        fields.title = "A editado".to_string();
        store
            .execute(&UpdateOpportunity {
                opportunity_id: a,
                fields,
            })
            .unwrap();

        let superseded = store.restore_scoped(&before, &applied, &scope);
        assert_eq!(store.opportunity(a).unwrap().title, "A editado");
        assert_eq!(superseded.opportunities, vec![a]);
    }

    #[test]
    fn test_scoped_restore_after_cascade() {
        let (mut store, novo, fechado) = board();
        add(&mut store, "A", fechado);
        let b = add(&mut store, "B", novo);
        add(&mut store, "C", fechado);
        store.load_notes(b, vec![]);
        let before = store.snapshot();

        let command = DeleteStage {
            stage_id: novo,
            policy: StageDeletePolicy::Cascade,
        };
        let scope = store.scope_of(&command);
        assert!(scope.thread);
        store.execute(&command).unwrap();
        assert!(store.thread().is_none());
        assert!(store.stage(novo).is_none());
        let applied = store.snapshot();

        store.restore_scoped(&before, &applied, &scope);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_orphaned_opportunities() {
        let (mut store, novo, _) = board();
        let a = add(&mut store, "A", novo);

        store
            .execute(&DeleteStage {
                stage_id: novo,
                policy: StageDeletePolicy::Orphan,
            })
            .unwrap();

        let orphans: Vec<_> = store.orphaned_opportunities().iter().map(|o| o.id).collect();
        assert_eq!(orphans, vec![a]);
        // still reachable through the stale id, but no stage renders it
        assert_eq!(store.opportunities_in_stage(novo).len(), 1);
        assert!(store.stages().iter().all(|s| s.id != novo));
    }

    #[test]
    fn test_replace_stage_repoints_opportunities() {
        let mut store = PipelineStore::new();
        let provisional = Stage::new("Novo".to_string(), 1);
        let provisional_id = provisional.id;
        store
            .execute(&CreateStage { stage: provisional })
            .unwrap();
        let a = add(&mut store, "A", provisional_id);

        let mut confirmed = Stage::new("Novo".to_string(), 1);
        confirmed.id = uuid::Uuid::new_v4();
        let confirmed_id = confirmed.id;
        store
            .execute(&ReplaceStage {
                provisional_id,
                stage: confirmed,
            })
            .unwrap();

        assert!(store.stage(provisional_id).is_none());
        assert_eq!(store.opportunity(a).unwrap().stage_id, confirmed_id);
    }

    #[test]
    fn test_append_note_only_shows_in_open_thread() {
        let (mut store, novo, _) = board();
        let a = add(&mut store, "A", novo);
        let b = add(&mut store, "B", novo);
        store.load_notes(a, vec![]);

        store
            .execute(&AppendNote {
                note: Note::new(b, None, "elsewhere".to_string()),
            })
            .unwrap();
        assert!(store.notes().is_empty());

        store
            .execute(&AppendNote {
                note: Note::new(a, None, "here".to_string()),
            })
            .unwrap();
        assert_eq!(store.notes().len(), 1);
    }
}
