pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpPipelineApi;
pub use memory::{ApiOperation, InMemoryApi, InjectedFailure};
pub use traits::PipelineApi;
