pub mod commands;
pub mod drag;
pub mod events;
pub mod field_update;
pub mod label;
pub mod note;
pub mod opportunity;
pub mod snapshot;
pub mod stage;
pub mod store;
pub mod validation;
pub mod view;

pub use drag::{DragState, DragTracker, DropOutcome, NoMoveReason};
pub use events::{PipelineEvent, RevertedMove, StageDeletion};
pub use field_update::FieldUpdate;
pub use label::{Label, LabelColor, LabelContext, LabelFilter, LabelId, NewLabel};
pub use note::{Note, NoteId, NoteThread};
pub use opportunity::{
    NewOpportunity, Opportunity, OpportunityDraft, OpportunityFields, OpportunityId,
    OpportunityPatch, PatientId,
};
pub use snapshot::{MutationScope, PipelineSnapshot};
pub use stage::{next_order_position, sorted_stages, Stage, StageId};
pub use store::PipelineStore;
pub use view::{BoardView, StageColumn};
