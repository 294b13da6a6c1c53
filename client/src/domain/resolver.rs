//! Session/identity resolution service.
//!
//! Turns an opaque auth session into an application user with a resolved
//! role. Resolution is infallible: backend trouble degrades to fallback
//! identities instead of failing, so an authenticated operator is never
//! locked out of the interface.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, RetryPolicy};
use crate::domain::member::{Member, Role};
use crate::domain::ports::{Returning, Table, TableStore};
use crate::domain::session::{AuthSession, SessionUser};
use crate::domain::wire;

/// Display name used when the admin profile cannot be persisted.
const ADMIN_FALLBACK_NAME: &str = "Admin (Fallback)";
/// Display name used when nothing identifies a fresh member.
const PLACEHOLDER_NAME: &str = "New User";

/// Resolves auth sessions into application users.
///
/// Holds the reserved admin email and the retry schedule for profile
/// lookups that race row creation. May write during resolution: a missing
/// profile for the reserved admin account is bootstrapped on first sight.
#[derive(Clone)]
pub struct IdentityResolver<S> {
    store: Arc<S>,
    admin_email: String,
    retry: RetryPolicy,
}

impl<S> IdentityResolver<S> {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            store,
            admin_email: config.admin_email().to_owned(),
            retry: config.retry(),
        }
    }

    fn is_admin_email(&self, email: &str) -> bool {
        email.eq_ignore_ascii_case(&self.admin_email)
    }
}

impl<S> IdentityResolver<S>
where
    S: TableStore,
{
    /// Resolve a session into an application user.
    ///
    /// `None` sessions resolve to `None`. Authenticated sessions always
    /// resolve to `Some` user with an unambiguous role, falling back to
    /// signup metadata and finally to a placeholder identity when no
    /// profile row exists.
    pub async fn resolve(&self, session: Option<&AuthSession>) -> Option<SessionUser> {
        let session = session?;
        let profile = self.fetch_profile_with_retry(session.user.id).await;

        if self.is_admin_email(&session.user.email) {
            return Some(self.resolve_admin(session, profile).await);
        }
        Some(Self::resolve_member(session, profile))
    }

    /// Fetch the profile row, retrying while it may still be materializing.
    ///
    /// A zero-row read is expected for brand-new identities and only logged
    /// at debug level; other read errors are logged and tolerated. Never
    /// fails.
    async fn fetch_profile_with_retry(&self, id: Uuid) -> Option<Member> {
        let attempts = self.retry.attempts().max(1);
        for attempt in 1..=attempts {
            match self.store.find_by_id(Table::Profiles, id).await {
                Ok(Some(row)) => match wire::decode::<Member>(row) {
                    Ok(member) => return Some(member),
                    Err(err) => {
                        warn!(error = %err, %id, "profile row failed to decode");
                        return None;
                    }
                },
                Ok(None) => {
                    debug!(attempt, %id, "profile row not visible yet");
                }
                Err(err) => {
                    warn!(error = %err, attempt, %id, "profile fetch failed");
                }
            }
            if attempt < attempts {
                sleep(self.retry.delay()).await;
            }
        }
        warn!(%id, attempts, "profile unavailable after retries");
        None
    }

    /// Resolve the reserved admin account, bootstrapping its profile if
    /// missing. The role is forced to admin whatever the stored row says.
    async fn resolve_admin(&self, session: &AuthSession, profile: Option<Member>) -> SessionUser {
        let profile = match profile {
            Some(member) => Some(member),
            None => self.bootstrap_admin_profile(session).await,
        };

        match profile {
            Some(member) => SessionUser {
                id: session.user.id,
                email: session.user.email.clone(),
                name: member.name.clone(),
                role: Role::Admin,
                profile: Some(member),
            },
            None => SessionUser {
                id: session.user.id,
                email: session.user.email.clone(),
                name: ADMIN_FALLBACK_NAME.to_owned(),
                role: Role::Admin,
                profile: None,
            },
        }
    }

    /// Persist the stock admin profile for a first-time admin sign-in.
    ///
    /// An insert failure is swallowed: the caller degrades to an in-memory
    /// admin identity rather than locking the operator out.
    async fn bootstrap_admin_profile(&self, session: &AuthSession) -> Option<Member> {
        let member = Self::admin_profile_seed(session);
        let row = match wire::encode(&member) {
            Ok(row) => row,
            Err(err) => {
                warn!(error = %err, "admin profile seed failed to encode");
                return None;
            }
        };

        match self.store.insert(Table::Profiles, row, Returning::Row).await {
            Ok(_) => {
                info!(id = %member.id, "admin profile created");
                Some(member)
            }
            Err(err) => {
                warn!(error = %err, "admin profile bootstrap failed");
                None
            }
        }
    }

    fn admin_profile_seed(session: &AuthSession) -> Member {
        Member {
            id: session.user.id,
            name: "Admin".to_owned(),
            email: session.user.email.clone(),
            role: Role::Admin,
            student_id: Some("ADMIN".to_owned()),
            course: Some("System".to_owned()),
            year: Some("N/A".to_owned()),
            organization: Some("Core Team".to_owned()),
            membership_paid: true,
            membership_expiry: NaiveDate::from_ymd_opt(2099, 12, 31),
        }
    }

    /// Resolve a regular member: profile first, then signup metadata, then
    /// a placeholder identity.
    fn resolve_member(session: &AuthSession, profile: Option<Member>) -> SessionUser {
        if let Some(member) = profile {
            return SessionUser {
                id: session.user.id,
                email: session.user.email.clone(),
                name: member.name.clone(),
                role: member.role,
                profile: Some(member),
            };
        }

        let metadata = &session.user.metadata;
        let name = metadata
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(PLACEHOLDER_NAME)
            .to_owned();
        let role = match metadata.get("role").and_then(Value::as_str) {
            Some("admin") => Role::Admin,
            _ => Role::Student,
        };

        SessionUser {
            id: session.user.id,
            email: session.user.email.clone(),
            name,
            role,
            profile: None,
        }
    }
}

#[cfg(test)]
mod tests;
