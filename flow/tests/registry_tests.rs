// tests/registry_tests.rs
mod common;

use common::*;
use flow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default)]
struct LoginContext {
  email: String,
  token: Option<String>,
}

#[tokio::test]
async fn registry_dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut drafts = Pipeline::<DraftContext, TestError>::new(&[("add", false, None)]);
  drafts.on_root("add", add_line_handler("add", "apple", 4));
  registry.register_pipeline(drafts);

  let mut logins = Pipeline::<LoginContext, TestError>::new(&[("issue_token", false, None)]);
  logins.on_root("issue_token", |ctx: ContextData<LoginContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.token = Some(format!("token-for-{}", guard.email));
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  registry.register_pipeline(logins);

  assert!(registry.is_registered::<DraftContext>());
  assert!(registry.is_registered::<LoginContext>());

  let draft_ctx = ContextData::new(DraftContext::default());
  assert_eq!(registry.run(draft_ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(draft_ctx.read().total_units, 4);

  let login_ctx = ContextData::new(LoginContext {
    email: "a@example.com".to_string(),
    token: None,
  });
  registry.run(login_ctx.clone()).await.unwrap();
  assert_eq!(login_ctx.read().token.as_deref(), Some("token-for-a@example.com"));
}

#[tokio::test]
async fn unregistered_context_type_is_reported() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let result = registry.run(ContextData::new(LoginContext::default())).await;
  match result.unwrap_err() {
    TestError::Flow(s) => {
      assert!(s.contains("NotRegistered"));
      assert!(s.contains("LoginContext"));
    }
    other => panic!("expected a flow error, got {:?}", other),
  }
}

#[tokio::test]
async fn handler_errors_surface_through_the_registry() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let mut drafts = Pipeline::<DraftContext, TestError>::new(&[("bad", false, None)]);
  drafts.on_root("bad", failing_handler("bad", "declined"));
  registry.register_pipeline(drafts);

  let result = registry.run(ContextData::new(DraftContext::default())).await;
  assert_eq!(result.unwrap_err(), TestError::Step("declined".to_string()));
}
