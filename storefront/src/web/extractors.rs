// storefront/src/web/extractors.rs

//! Bearer-token identity extractors.

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};
use uuid::Uuid;

/// The caller's session, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub token: String,
}

/// Like `AuthenticatedUser`, but a request without an `Authorization` header
/// resolves to `None`. A header carrying an unknown or expired token is still
/// rejected with 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

fn bearer_token(req: &HttpRequest) -> Option<Result<String, AppError>> {
  let value = req.headers().get(AUTHORIZATION)?;
  let parsed = value
    .to_str()
    .ok()
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_string)
    .ok_or_else(|| AppError::Auth("Malformed Authorization header.".to_string()));
  Some(parsed)
}

async fn resolve_session(state: Option<web::Data<AppState>>, token: String) -> Result<AuthenticatedUser, AppError> {
  let state = state.ok_or_else(|| AppError::Config("AppState is not registered with the app.".to_string()))?;
  match state.repos.sessions.find_active(&token, Utc::now()).await? {
    Some(session) => {
      debug!(user_id = %session.user_id, "Session resolved.");
      Ok(AuthenticatedUser {
        user_id: session.user_id,
        token,
      })
    }
    None => {
      warn!("Unknown or expired session token.");
      Err(AppError::Auth("Session is invalid or has expired.".to_string()))
    }
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let state = req.app_data::<web::Data<AppState>>().cloned();
    Box::pin(async move {
      let token = match token {
        Some(parsed) => parsed?,
        None => return Err(AppError::Auth("Authentication required.".to_string())),
      };
      resolve_session(state, token).await
    })
  }
}

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let state = req.app_data::<web::Data<AppState>>().cloned();
    Box::pin(async move {
      match token {
        None => Ok(MaybeUser(None)),
        Some(parsed) => Ok(MaybeUser(Some(resolve_session(state, parsed?).await?))),
      }
    })
  }
}
