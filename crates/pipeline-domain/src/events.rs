use crate::{Note, Opportunity, OpportunityId, Stage, StageId};
use serde::Serialize;

/// What happened to the opportunities of a deleted stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "opportunities")]
pub enum StageDeletion {
    Empty,
    Orphaned(Vec<OpportunityId>),
    Cascaded(Vec<OpportunityId>),
}

/// Where a card whose move was undone goes back to, so a front end can
/// animate it home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevertedMove {
    pub opportunity_id: OpportunityId,
    pub origin_stage: StageId,
}

/// Board changes confirmed by the server, plus rollbacks of ones it refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageCreated {
        stage: Stage,
    },
    StageRenamed {
        stage: Stage,
    },
    StageDeleted {
        stage: Stage,
        resolution: StageDeletion,
    },
    OpportunityCreated {
        opportunity: Opportunity,
    },
    OpportunityMoved {
        opportunity: Opportunity,
        from: StageId,
        to: StageId,
    },
    OpportunityUpdated {
        opportunity: Opportunity,
    },
    OpportunityDeleted {
        opportunity_id: OpportunityId,
    },
    NoteAdded {
        note: Note,
    },
    /// An optimistic change was undone.
    Reverted {
        action: String,
        error: String,
        restore_to: Option<RevertedMove>,
    },
}

impl PipelineEvent {
    pub fn is_revert(&self) -> bool {
        matches!(self, PipelineEvent::Reverted { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::StageCreated { .. } => "stage_created",
            PipelineEvent::StageRenamed { .. } => "stage_renamed",
            PipelineEvent::StageDeleted { .. } => "stage_deleted",
            PipelineEvent::OpportunityCreated { .. } => "opportunity_created",
            PipelineEvent::OpportunityMoved { .. } => "opportunity_moved",
            PipelineEvent::OpportunityUpdated { .. } => "opportunity_updated",
            PipelineEvent::OpportunityDeleted { .. } => "opportunity_deleted",
            PipelineEvent::NoteAdded { .. } => "note_added",
            PipelineEvent::Reverted { .. } => "reverted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = PipelineEvent::OpportunityDeleted {
            opportunity_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "opportunity_deleted");
        assert_eq!(json["event"], event.name());
    }

    #[test]
    fn test_reverted_carries_origin() {
        let opportunity_id = Uuid::new_v4();
        let origin_stage = Uuid::new_v4();
        let event = PipelineEvent::Reverted {
            action: "move".to_string(),
            error: "Transport error: timeout".to_string(),
            restore_to: Some(RevertedMove {
                opportunity_id,
                origin_stage,
            }),
        };
        assert!(event.is_revert());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["restore_to"]["origin_stage"], origin_stage.to_string());
    }

    #[test]
    fn test_stage_deletion_serialization() {
        let json = serde_json::to_value(StageDeletion::Empty).unwrap();
        assert_eq!(json["kind"], "empty");

        let id = Uuid::new_v4();
        let json = serde_json::to_value(StageDeletion::Cascaded(vec![id])).unwrap();
        assert_eq!(json["kind"], "cascaded");
        assert_eq!(json["opportunities"][0], id.to_string());
    }
}
