//! The signed-in session, passed explicitly to whatever needs the user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error,
  backend::{Identity, RescueBackend},
  entitlement::{Plan, ProfileUpdate, User},
};

/// How often an entitlement change is retried after losing a race.
const SWAP_ATTEMPTS: usize = 3;

/// Errors from session operations: either the backend failed or a domain
/// rule did.
#[derive(Debug, thiserror::Error)]
pub enum SessionError<E: std::error::Error + 'static> {
  #[error("backend error: {0}")]
  Backend(#[source] E),
  #[error(transparent)]
  Domain(#[from] Error),
}

pub type SessionResult<T, E> = std::result::Result<T, SessionError<E>>;

/// An identity together with its current profile.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
  pub identity: Identity,
  pub user:     User,
}

impl Session {
  /// Load the profile for `identity`.
  pub async fn load<B: RescueBackend>(
    backend: &B,
    identity: Identity,
  ) -> SessionResult<Self, B::Error> {
    let user = backend
      .read_profile(identity.user_id)
      .await
      .map_err(SessionError::Backend)?
      .ok_or(Error::UserNotFound(identity.user_id))?;
    Ok(Self { identity, user })
  }

  /// Re-read the profile from the backend.
  pub async fn refresh<B: RescueBackend>(&mut self, backend: &B) -> SessionResult<(), B::Error> {
    let user = backend
      .read_profile(self.identity.user_id)
      .await
      .map_err(SessionError::Backend)?
      .ok_or(Error::UserNotFound(self.identity.user_id))?;
    self.user = user;
    Ok(())
  }

  /// Fail unless the terms of use have been accepted.
  pub fn require_terms(&self) -> Result<(), Error> {
    if self.user.agreed_to_terms { Ok(()) } else { Err(Error::TermsNotAccepted) }
  }

  pub async fn accept_terms<B: RescueBackend>(&mut self, backend: &B) -> SessionResult<(), B::Error> {
    self.user = backend
      .update_profile(self.identity.user_id, ProfileUpdate::accept_terms())
      .await
      .map_err(SessionError::Backend)?;
    Ok(())
  }

  /// Charge one scan against the stored counter, not the loaded copy.
  pub async fn consume_scan<B: RescueBackend>(&mut self, backend: &B) -> SessionResult<(), B::Error> {
    let charged = backend
      .consume_scan(self.identity.user_id)
      .await
      .map_err(SessionError::Backend)?;
    match charged {
      Some(user) => {
        self.user = user;
        Ok(())
      }
      None => {
        self.user.scans_remaining = 0;
        Err(Error::ScanQuotaExhausted.into())
      }
    }
  }

  /// Apply the tentative premium grant for `checkout_id`.
  pub async fn begin_upgrade<B: RescueBackend>(
    &mut self,
    backend: &B,
    checkout_id: &str,
    plan: Plan,
    now: DateTime<Utc>,
  ) -> SessionResult<(), B::Error> {
    self
      .swap_entitlement(backend, |user| user.begin_upgrade(checkout_id, plan, now))
      .await
  }

  /// Confirm (`completed == true`) or roll back the pending upgrade.
  pub async fn settle_upgrade<B: RescueBackend>(
    &mut self,
    backend: &B,
    checkout_id: &str,
    completed: bool,
  ) -> SessionResult<(), B::Error> {
    self
      .swap_entitlement(backend, |user| {
        if completed {
          user.confirm_upgrade(checkout_id).map(drop)
        } else {
          user.fail_upgrade(checkout_id).map(drop)
        }
      })
      .await
  }

  /// Apply `change` to the loaded profile and store it only if nothing else
  /// changed the entitlement meanwhile. A lost race re-reads the profile and
  /// applies `change` again.
  async fn swap_entitlement<B, F>(&mut self, backend: &B, mut change: F) -> SessionResult<(), B::Error>
  where
    B: RescueBackend,
    F: FnMut(&mut User) -> Result<(), Error>,
  {
    for _ in 0..SWAP_ATTEMPTS {
      let expected = self.user.entitlement();
      let mut next = self.user.clone();
      change(&mut next)?;

      let swapped = backend
        .swap_entitlement(self.identity.user_id, &expected, &next.entitlement())
        .await
        .map_err(SessionError::Backend)?;
      match swapped {
        Some(user) => {
          self.user = user;
          return Ok(());
        }
        None => self.refresh(backend).await?,
      }
    }
    Err(Error::ProfileChanged(self.identity.user_id).into())
  }
}
