// storefront/src/pipelines/otp_pipeline.rs

//! Email one-time-code login: issuing a code, then exchanging it for a session.

use crate::errors::AppError;
use crate::models::Session;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{OtpRequestCtxData, OtpVerifyCtxData};
use crate::services::auth_service;
use crate::state::AppState;
use chrono::{Duration, Utc};
use flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_CODE: &str = "Invalid or expired code.";

pub fn register_otp_request_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<OtpRequestCtxData, AppError>::new(&[
    ("normalize_email", false, None),
    ("find_or_create_account", false, None),
    ("issue_login_code", false, None),
    ("send_login_code_email", false, None),
  ])
  .with_name("otp_request");

  p.on_root("normalize_email", |ctx_data: ContextData<OtpRequestCtxData>| async move {
    let raw = ctx_data.read().raw_email.clone();
    let email = auth_service::normalize_email(&raw)?;
    ctx_data.write().email = Some(email);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("find_or_create_account", |ctx_data: ContextData<OtpRequestCtxData>| async move {
    let (email, users) = {
      let guard = ctx_data.read();
      (guard.email.clone().unwrap_or_default(), guard.app_state.repos.users.clone())
    };
    let user = users.find_or_create_by_email(&email).await?;
    info!(user_id = %user.id, "OTP request: account resolved.");
    ctx_data.write().user = Some(user);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("issue_login_code", |ctx_data: ContextData<OtpRequestCtxData>| async move {
    let (email, ttl_secs, otps) = {
      let guard = ctx_data.read();
      (
        guard.email.clone().unwrap_or_default(),
        guard.app_state.config.otp_ttl_secs,
        guard.app_state.repos.otps.clone(),
      )
    };
    let code = auth_service::generate_otp_code();
    let code_hash = auth_service::hash_otp_code(&code)?;
    let expires_at = Utc::now() + Duration::seconds(ttl_secs);

    otps.replace(&email, &code_hash, expires_at).await?;
    info!(%expires_at, "OTP request: challenge stored.");
    {
      let mut guard = ctx_data.write();
      guard.code = Some(code);
      guard.expires_at = Some(expires_at);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("send_login_code_email", common_steps::send_login_code_email_step);

  registry.register_pipeline(p);
  info!("OTP request pipeline registered.");
}

pub fn register_otp_verify_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<OtpVerifyCtxData, AppError>::new(&[
    ("validate_verify_input", false, None),
    ("load_challenge", false, None),
    ("check_code", false, None),
    ("create_session", false, None),
  ])
  .with_name("otp_verify");

  p.on_root("validate_verify_input", |ctx_data: ContextData<OtpVerifyCtxData>| async move {
    let (raw, code) = {
      let guard = ctx_data.read();
      (guard.raw_email.clone(), guard.code.trim().to_string())
    };
    let email = auth_service::normalize_email(&raw)?;
    if !auth_service::is_well_formed_code(&code) {
      return Err(AppError::Validation(format!(
        "Code must be {} digits.",
        auth_service::OTP_DIGITS
      )));
    }
    {
      let mut guard = ctx_data.write();
      guard.email = Some(email);
      guard.code = code;
    }
    Ok(PipelineControl::Continue)
  });

  p.on_root("load_challenge", |ctx_data: ContextData<OtpVerifyCtxData>| async move {
    let (email, otps) = {
      let guard = ctx_data.read();
      (guard.email.clone().unwrap_or_default(), guard.app_state.repos.otps.clone())
    };
    let Some(challenge) = otps.find(&email).await? else {
      warn!("OTP verify: no pending challenge.");
      return Err(AppError::Auth(INVALID_CODE.to_string()));
    };
    if challenge.is_expired(Utc::now()) {
      warn!(expired_at = %challenge.expires_at, "OTP verify: challenge expired.");
      otps.delete(&email).await?;
      return Err(AppError::Auth(INVALID_CODE.to_string()));
    }
    ctx_data.write().challenge = Some(challenge);
    Ok(PipelineControl::Continue)
  });

  p.on_root("check_code", |ctx_data: ContextData<OtpVerifyCtxData>| async move {
    let (email, code, challenge, max_attempts, otps) = {
      let guard = ctx_data.read();
      (
        guard.email.clone().unwrap_or_default(),
        guard.code.clone(),
        guard.challenge.clone(),
        guard.app_state.config.otp_max_attempts,
        guard.app_state.repos.otps.clone(),
      )
    };
    let challenge = challenge.ok_or_else(|| AppError::Internal("Challenge missing from context.".to_string()))?;

    if challenge.attempts >= max_attempts {
      warn!(attempts = challenge.attempts, "OTP verify: attempt limit reached.");
      return Err(AppError::Auth("Too many attempts. Request a new code.".to_string()));
    }
    if !auth_service::verify_otp_code(&challenge.code_hash, &code)? {
      let attempts = otps.record_failed_attempt(&email).await?;
      warn!(attempts = ?attempts, "OTP verify: code mismatch.");
      return Err(AppError::Auth(INVALID_CODE.to_string()));
    }

    otps.delete(&email).await?;
    Ok(PipelineControl::Continue)
  });

  p.on_root("create_session", |ctx_data: ContextData<OtpVerifyCtxData>| async move {
    let (email, ttl_hours, repos) = {
      let guard = ctx_data.read();
      (
        guard.email.clone().unwrap_or_default(),
        guard.app_state.config.session_ttl_hours,
        guard.app_state.repos.clone(),
      )
    };
    let user = repos.users.find_or_create_by_email(&email).await?;
    let now = Utc::now();
    let session = Session {
      token: auth_service::generate_session_token(),
      user_id: user.id,
      expires_at: now + Duration::hours(ttl_hours),
      created_at: now,
    };
    repos.sessions.create(&session).await?;
    info!(user_id = %user.id, expires_at = %session.expires_at, "OTP verify: session created.");
    {
      let mut guard = ctx_data.write();
      guard.user = Some(user);
      guard.session = Some(session);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(p);
  info!("OTP verify pipeline registered.");
}
