// storyflow/src/pipeline/mod.rs

//! `Pipeline<TData, Err>`: definition, handler registration and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
