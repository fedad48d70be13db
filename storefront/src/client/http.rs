// storefront/src/client/http.rs

//! JSON over HTTP against the storefront API. No retries.

use crate::client::config::ClientConfig;
use crate::client::errors::{ClientError, ClientResult};
use crate::client::identity::IdentityResolver;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
  Required,
  None,
}

#[derive(Clone)]
pub struct ApiConnection {
  base_url: String,
  client: Client,
  identity: IdentityResolver,
}

impl ApiConnection {
  pub fn new(config: &ClientConfig, identity: IdentityResolver) -> ClientResult<Self> {
    let client = Client::builder()
      .timeout(config.request_timeout)
      .build()
      .map_err(ClientError::from)?;
    Ok(Self {
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
      client,
      identity,
    })
  }

  pub fn identity(&self) -> &IdentityResolver {
    &self.identity
  }

  pub async fn get<O: DeserializeOwned>(&self, path: &str, auth: AuthMode) -> ClientResult<O> {
    self.request(Method::GET, path, None::<()>, auth).await
  }

  pub async fn post<I: Serialize, O: DeserializeOwned>(&self, path: &str, body: I, auth: AuthMode) -> ClientResult<O> {
    self.request(Method::POST, path, Some(body), auth).await
  }

  pub async fn put<I: Serialize, O: DeserializeOwned>(&self, path: &str, body: I, auth: AuthMode) -> ClientResult<O> {
    self.request(Method::PUT, path, Some(body), auth).await
  }

  pub async fn delete<O: DeserializeOwned>(&self, path: &str, auth: AuthMode) -> ClientResult<O> {
    self.request(Method::DELETE, path, None::<()>, auth).await
  }

  async fn request<I, O>(&self, method: Method, path: &str, body: Option<I>, auth: AuthMode) -> ClientResult<O>
  where
    I: Serialize,
    O: DeserializeOwned,
  {
    let url = format!("{}{}", self.base_url, path);
    let mut builder = self.client.request(method.clone(), url.as_str());

    if let Some(token) = self.identity.token() {
      builder = builder.bearer_auth(token);
    } else if auth == AuthMode::Required {
      return Err(ClientError::Unauthorized("No session token stored.".to_string()));
    }
    if let Some(body) = body {
      builder = builder.json(&body);
    }

    debug!(%method, %url, "Sending API request.");
    let response = builder.send().await?;
    decode(response).await
  }
}

async fn decode<O: DeserializeOwned>(response: Response) -> ClientResult<O> {
  let status = response.status();
  if status.is_success() {
    return response.json::<O>().await.map_err(|e| ClientError::Decode(e.to_string()));
  }

  let message = response
    .json::<Value>()
    .await
    .ok()
    .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
  warn!(status = status.as_u16(), %message, "API request failed.");

  if status == StatusCode::UNAUTHORIZED {
    Err(ClientError::Unauthorized(message))
  } else {
    Err(ClientError::Server {
      status: status.as_u16(),
      message,
    })
  }
}
