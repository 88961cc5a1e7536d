// bazaar/app/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;

/// Header carrying the caller's user id. Authentication itself happens in
/// front of this service; we only trust what the gateway forwards.
pub const USER_ID_HEADER: &str = "X-User-ID";

fn user_id_from(req: &HttpRequest) -> Result<Option<i64>, AppError> {
  let Some(raw) = req.headers().get(USER_ID_HEADER) else {
    return Ok(None);
  };
  raw
    .to_str()
    .ok()
    .and_then(|s| s.trim().parse::<i64>().ok())
    .filter(|id| *id > 0)
    .map(Some)
    .ok_or_else(|| {
      warn!("Malformed {} header.", USER_ID_HEADER);
      AppError::Auth(format!("{} must be a positive integer", USER_ID_HEADER))
    })
}

/// A caller that must be identified.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let outcome = match user_id_from(req) {
      Ok(Some(user_id)) => Ok(AuthenticatedUser { user_id }),
      Ok(None) => {
        warn!("AuthenticatedUser extractor: missing {} header.", USER_ID_HEADER);
        Err(AppError::Auth(format!("missing {} header", USER_ID_HEADER)))
      }
      Err(e) => Err(e),
    };
    ready(outcome)
  }
}

/// A caller that may be anonymous. A malformed header counts as anonymous.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<i64>);

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Ok(MaybeUser(user_id_from(req).unwrap_or(None))))
  }
}
