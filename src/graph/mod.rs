//! Graph construction, validation, and the compiled runnable form.

pub mod builder;
mod compile;
pub(crate) mod compiled;
pub mod edges;
mod viz;

pub use builder::GraphBuilder;
pub use compile::GraphValidationError;
pub use compiled::CompiledGraph;
pub use edges::{ConditionalEdge, RouterFn};
