//! HTTP Basic-auth verification and the session extractors built on it.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use refurrm_core::{backend::RescueBackend, payment::PaymentGateway, session::Session};

use crate::{AppState, error::ApiError};

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Verify Basic credentials and return the authenticated email.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<String, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  if email != config.email {
    return Err(ApiError::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(email.to_owned())
}

/// The authenticated user's session, loaded fresh for this request.
pub struct CurrentSession(pub Session);

/// A [`CurrentSession`] whose user has accepted the terms of use.
pub struct AgreedSession(pub Session);

impl<B, G> FromRequestParts<AppState<B, G>> for CurrentSession
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<B, G>,
  ) -> Result<Self, Self::Rejection> {
    let email = verify_auth(&parts.headers, &state.auth)?;
    let identity = state
      .backend
      .current_user(&email)
      .await
      .map_err(ApiError::backend)?
      .ok_or(ApiError::Unauthorized)?;
    let session = Session::load(state.backend.as_ref(), identity).await?;
    Ok(CurrentSession(session))
  }
}

impl<B, G> FromRequestParts<AppState<B, G>> for AgreedSession
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<B, G>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
    session.require_terms()?;
    Ok(AgreedSession(session))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::{HeaderValue, header};
  use rand_core::OsRng;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig { email: "ops@refurrm.test".to_string(), password_hash: hash }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(email: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{pass}")))
  }

  #[test]
  fn correct_credentials_yield_the_email() {
    let cfg = config("secret");
    let email = verify_auth(&headers(&basic("ops@refurrm.test", "secret")), &cfg).unwrap();
    assert_eq!(email, "ops@refurrm.test");
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("ops@refurrm.test", "wrong")), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_email() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("someone@else.test", "secret")), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(verify_auth(&HeaderMap::new(), &cfg), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    let res = verify_auth(&headers("Basic !!!not-base64!!!"), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }
}
