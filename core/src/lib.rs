// storyflow/src/lib.rs

//! Storyflow: a small asynchronous step-pipeline engine.
//!
//! A `Pipeline<TData, Err>` is an ordered list of named steps. Each step may carry
//! `before`, `on` and `after` handlers that receive a shared `ContextData<TData>`.
//! Steps can be optional (no handler registered means "skip") and can carry a
//! skip condition evaluated against the context right before the step runs.
//! Any handler may stop the pipeline early with `PipelineControl::Stop`.
//!
//! A `Registry<E>` keeps one pipeline per context type, so an application can
//! register its workflows once at startup and later run them by handing over a
//! freshly built context.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Registry;
