pub mod config;
pub mod error;
pub mod result;

pub use config::{ApiConfig, AppConfig, StageDeletePolicy};
pub use error::PipelineError;
pub use result::PipelineResult;
