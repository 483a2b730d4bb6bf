//! Keeps the local pipeline store in step with the remote API.
//!
//! Every mutation is applied to the store first, then sent to the server.
//! If the server refuses, only the entities that mutation touched are put
//! back, so other requests still in flight keep their optimistic state.

pub mod board;
pub mod drag;
pub mod labels;
pub mod opportunities;
pub mod settings;
pub mod stages;

pub use board::PipelineBoard;
pub use settings::BoardSettings;
