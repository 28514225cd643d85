//! Ownership-based authorization for itinerary actions.
//!
//! Mutating service operations take an `Authorized<ItineraryRecord>`, which
//! can only be obtained from [`authorize`], so they cannot run without the
//! check passing first.

use crate::domain::ItineraryRecord;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    ItineraryCreate,
    ItineraryView,
    ItineraryUpdate,
    ItineraryDelete,
}

impl PolicyAction {
    fn verb(&self) -> &'static str {
        match self {
            PolicyAction::ItineraryCreate => "create",
            PolicyAction::ItineraryView => "view",
            PolicyAction::ItineraryUpdate => "update",
            PolicyAction::ItineraryDelete => "delete",
        }
    }
}

/// Evaluate `action` for `actor` (None = anonymous) against `target`.
pub fn enforce(
    actor: Option<&AuthUser>,
    action: PolicyAction,
    target: Option<&ItineraryRecord>,
) -> PolicyResult<()> {
    match action {
        PolicyAction::ItineraryView => Ok(()),
        PolicyAction::ItineraryCreate => match actor {
            Some(_) => Ok(()),
            None => Err(AppError::Unauthorized("Authentication required".to_string())),
        },
        PolicyAction::ItineraryUpdate | PolicyAction::ItineraryDelete => {
            let actor = actor
                .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
            let target = target.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("{} check without a target", action.verb()))
            })?;
            if target.is_owned_by(actor.user_id) {
                Ok(())
            } else {
                Err(AppError::Forbidden(format!(
                    "You are not allowed to {} this itinerary",
                    action.verb()
                )))
            }
        }
    }
}

/// Proof that `action` passed the policy check for the wrapped value
#[derive(Debug, Clone)]
pub struct Authorized<T> {
    inner: T,
    action: PolicyAction,
}

impl<T> Authorized<T> {
    pub fn action(&self) -> PolicyAction {
        self.action
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Check `action` on `record` and wrap it on success
pub fn authorize(
    actor: &AuthUser,
    action: PolicyAction,
    record: ItineraryRecord,
) -> PolicyResult<Authorized<ItineraryRecord>> {
    enforce(Some(actor), action, Some(&record))?;
    Ok(Authorized {
        inner: record,
        action,
    })
}
