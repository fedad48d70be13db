// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::{OtpRequestCtxData, OtpVerifyCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use flow::{ContextData, PipelineResult};

#[derive(Deserialize, Debug)]
pub struct OtpRequestPayload {
  pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct OtpVerifyPayload {
  pub email: String,
  pub code: String,
}

#[instrument(name = "handler::request_otp", skip_all)]
pub async fn request_otp_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<OtpRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(OtpRequestCtxData::new(
    app_state.get_ref().clone(),
    req_payload.into_inner().email,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let expires_at = ctx_data.read().expires_at;
      Ok(HttpResponse::Ok().json(json!({
        "message": "A sign-in code has been sent.",
        "expiresAt": expires_at
      })))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Code request was halted.".to_string())),
  }
}

#[instrument(name = "handler::verify_otp", skip_all)]
pub async fn verify_otp_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<OtpVerifyPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(OtpVerifyCtxData::new(
    app_state.get_ref().clone(),
    payload.email,
    payload.code,
  ));

  match app_state.flows.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let (user, session) = {
        let guard = ctx_data.read();
        (guard.user.clone(), guard.session.clone())
      };
      let (Some(user), Some(session)) = (user, session) else {
        return Err(AppError::Internal("Verification completed without a session.".to_string()));
      };
      info!(user_id = %user.id, "Signed in with one-time code.");
      Ok(HttpResponse::Ok().json(json!({
        "token": session.token,
        "userId": user.id,
        "email": user.email,
        "expiresAt": session.expires_at
      })))
    }
    Ok(PipelineResult::Stopped) => Err(AppError::Internal("Verification was halted.".to_string())),
    Err(app_err) => {
      warn!(error = %app_err, "One-time code verification failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::logout", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn logout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.repos.sessions.revoke(&auth_user.token).await?;
  info!("Session revoked.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Signed out." })))
}
