use pipeline_core::PipelineResult;

use crate::{MutationScope, NoteThread, Opportunity, Stage};

pub mod note_commands;
pub mod opportunity_commands;
pub mod stage_commands;

pub use note_commands::*;
pub use opportunity_commands::*;
pub use stage_commands::*;

/// A mutation of the in-memory board.
/// Commands validate against the current state before changing anything, so
/// a failed `execute` leaves the store untouched.
pub trait Command: Send + Sync {
    /// Apply this command to the store contents.
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()>;

    /// Entities this command will touch, computed before it runs.
    fn scope(&self, context: &CommandContext) -> MutationScope;

    /// Human-readable description of what this command does.
    fn description(&self) -> String;
}

/// Mutable view over the store's collections handed to commands.
pub struct CommandContext<'a> {
    pub stages: &'a mut Vec<Stage>,
    pub opportunities: &'a mut Vec<Opportunity>,
    pub thread: &'a mut Option<NoteThread>,
}

impl CommandContext<'_> {
    pub(crate) fn thread_is_for(&self, opportunity_id: uuid::Uuid) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|t| t.opportunity_id == opportunity_id)
    }
}
