// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::repo::Repositories;
use crate::services::email_mock::MockMailer;
use flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub repos: Repositories,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub mailer: Arc<MockMailer>,
}

impl AppState {
  /// Builds the state and registers every pipeline against it.
  pub fn new(repos: Repositories, config: Arc<AppConfig>) -> Self {
    let mailer = Arc::new(MockMailer::new(config.mock_email_sender.clone()));
    Self::with_mailer(repos, config, mailer)
  }

  pub fn with_mailer(repos: Repositories, config: Arc<AppConfig>, mailer: Arc<MockMailer>) -> Self {
    let state = Self {
      repos,
      flows: Arc::new(FlowRegistry::new()),
      mailer,
      config,
    };
    crate::pipelines::register_all_pipelines(&state.flows, &state);
    state
  }
}
