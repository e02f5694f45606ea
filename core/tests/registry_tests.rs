// tests/registry_tests.rs
mod common;

use common::*;
use storyflow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, Registry};

#[derive(Clone, Debug, Default)]
struct SubmissionCtx {
  vendor_order_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct WebhookCtx {
  acknowledged: bool,
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut submission = Pipeline::<SubmissionCtx, TestError>::new(&[("submit", false, None)]);
  submission.on_root("submit", |ctx: ContextData<SubmissionCtx>| async move {
    ctx.write().vendor_order_id = Some("MX-1".to_string());
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  registry.register_pipeline(submission);

  let mut webhook = Pipeline::<WebhookCtx, TestError>::new(&[("ack", false, None)]);
  webhook.on_root("ack", |ctx: ContextData<WebhookCtx>| async move {
    ctx.write().acknowledged = true;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  registry.register_pipeline(webhook);

  assert!(registry.is_registered::<SubmissionCtx>());
  assert!(registry.is_registered::<WebhookCtx>());

  let submission_ctx = ContextData::new(SubmissionCtx::default());
  assert_eq!(registry.run(submission_ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(submission_ctx.read().vendor_order_id.as_deref(), Some("MX-1"));

  let webhook_ctx = ContextData::new(WebhookCtx::default());
  registry.run(webhook_ctx.clone()).await.unwrap();
  assert!(webhook_ctx.read().acknowledged);
}

#[tokio::test]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let result = registry.run(ContextData::new(WebhookCtx::default())).await;

  match result {
    Err(TestError::Flow(s)) => assert!(s.contains("NotRegistered")),
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn handler_errors_pass_through_the_registry() {
  setup_tracing();
  let registry = Registry::<TestError>::new();
  let mut pipeline = Pipeline::<SubmissionCtx, TestError>::new(&[("submit", false, None)]);
  pipeline.on_root("submit", |_ctx: ContextData<SubmissionCtx>| async move {
    Err::<PipelineControl, _>(TestError::Step("timeout".to_string()))
  });
  registry.register_pipeline(pipeline);

  let result = registry.run(ContextData::new(SubmissionCtx::default())).await;
  assert_eq!(result.unwrap_err(), TestError::Step("timeout".to_string()));
}

#[tokio::test]
async fn later_registration_replaces_earlier_one() {
  setup_tracing();
  let registry = Registry::<FlowError>::default();

  let mut first = Pipeline::<WebhookCtx, FlowError>::new(&[("ack", false, None)]);
  first.on_root("ack", |_ctx: ContextData<WebhookCtx>| async move {
    Ok::<_, FlowError>(PipelineControl::Stop)
  });
  registry.register_pipeline(first);

  let mut second = Pipeline::<WebhookCtx, FlowError>::new(&[("ack", false, None)]);
  second.on_root("ack", |_ctx: ContextData<WebhookCtx>| async move {
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  registry.register_pipeline(second);

  let result = registry.run(ContextData::new(WebhookCtx::default())).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);
}
