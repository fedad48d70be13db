// tests/error_handling_tests.rs
mod common;

use common::*;
use flow::{ContextData, FlowError, Pipeline, PipelineControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn required_step_without_handlers_fails_with_handler_missing() {
  setup_tracing();
  let pipeline = Pipeline::<DraftContext, TestError>::new(&[("reserve_stock", false, None)]);
  let result = pipeline.run(ContextData::new(DraftContext::default())).await;

  match result.unwrap_err() {
    TestError::Flow(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("reserve_stock"));
    }
    other => panic!("expected a flow error, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn pipeline_can_use_flow_error_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<DraftContext, FlowError>::new(&[("task", false, None)]);
  pipeline.on_root("task", |_ctx: ContextData<DraftContext>| {
    Box::pin(async move { Err::<PipelineControl, FlowError>(anyhow::anyhow!("gateway unreachable").into()) })
  });

  let err = pipeline.run(ContextData::new(DraftContext::default())).await.unwrap_err();
  match err {
    FlowError::Handler { source } => assert_eq!(source.to_string(), "gateway unreachable"),
    other => panic!("expected FlowError::Handler, got {:?}", other),
  }
}

#[test]
#[should_panic(expected = "not found in pipeline")]
fn registering_a_handler_for_an_unknown_step_panics() {
  let mut pipeline = Pipeline::<DraftContext, TestError>::new(&[("a", false, None)]);
  pipeline.on_root("typo", add_line_handler("typo", "x", 1));
}
