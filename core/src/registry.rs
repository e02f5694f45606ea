// storyflow/src/registry.rs

//! `Registry<E>`: one pipeline per context data type, run by handing over a context.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedPipeline<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` holds a `ContextData<TData>` for the wrapped pipeline's `TData`.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct RegisteredPipeline<TData, PipeErr, AppErr>
where
  TData: 'static + Send + Sync,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<PipeErr> + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, PipeErr>>,
  _phantom: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, PipeErr, AppErr> ErasedPipeline<AppErr> for RegisteredPipeline<TData, PipeErr, AppErr>
where
  TData: 'static + Send + Sync,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<PipeErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let typed_ctx = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
        event!(Level::ERROR, %expected_type, "Context object type mismatch.");
        return Err(AppErr::from(FlowError::TypeMismatch { expected_type }));
      }
    };
    self.pipeline.run(typed_ctx).await.map_err(AppErr::from)
  }
}

/// Pipeline registry keyed by context data type.
///
/// `AppErr` is what `run` returns; it must absorb both engine errors and the
/// error type of every registered pipeline.
pub struct Registry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipelines: Mutex<HashMap<TypeId, Arc<dyn ErasedPipeline<AppErr>>>>,
}

impl<AppErr> Default for Registry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> Registry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      pipelines: Mutex::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for its context type, replacing any earlier one.
  pub fn register_pipeline<TData, PipeErr>(&self, pipeline: Pipeline<TData, PipeErr>)
  where
    TData: 'static + Send + Sync,
    PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<PipeErr>,
  {
    event!(Level::DEBUG, tdata_type = %std::any::type_name::<TData>(), "Registering pipeline.");
    let entry = RegisteredPipeline::<TData, PipeErr, AppErr> {
      pipeline: Arc::new(pipeline),
      _phantom: PhantomData,
    };
    self.pipelines.lock().insert(TypeId::of::<TData>(), Arc::new(entry));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.pipelines.lock().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  #[instrument(name = "Registry::run", skip_all, fields(tdata_type = %std::any::type_name::<TData>()))]
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = {
      let guard = self.pipelines.lock();
      guard.get(&TypeId::of::<TData>()).cloned()
    };
    let runner = runner.ok_or_else(|| {
      let type_name = std::any::type_name::<TData>().to_string();
      event!(Level::ERROR, %type_name, "No pipeline registered.");
      AppErr::from(FlowError::NotRegistered { type_name })
    })?;

    runner.run_erased(Box::new(ctx_data)).await
  }
}
