// storyflow/src/core/context.rs

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A boxed asynchronous step handler.
///
/// It receives a clone of the shared context and resolves to a flow signal or the
/// pipeline's error type. Handlers lock the context to read inputs and write
/// results, and must release those locks before awaiting I/O.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
