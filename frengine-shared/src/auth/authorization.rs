/// Ownership authorization
///
/// Every project has exactly one owning account and only that account may
/// mutate it. There are no roles and no shared access.
///
/// These checks are pure and never fetch anything. Callers fetch the
/// resource first, and a missing resource is reported as not found before
/// authorization runs, so a denial never reveals more than the fetch did.
///
/// # Example
///
/// ```
/// use frengine_shared::auth::authorization::{authorize_mutation, Decision};
/// use uuid::Uuid;
///
/// let owner = Uuid::now_v7();
/// let stranger = Uuid::now_v7();
///
/// assert_eq!(authorize_mutation(owner, owner), Decision::Allow);
/// assert_eq!(authorize_mutation(stranger, owner), Decision::Forbidden);
/// ```

use tracing::debug;
use uuid::Uuid;

use super::middleware::Identity;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The caller does not own the resource
    #[error("Not authorized to modify this resource")]
    Forbidden,
}

/// Outcome of an ownership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Forbidden,
}

/// `Allow` iff the acting user owns the resource
pub fn authorize_mutation(actor_id: Uuid, owner_id: Uuid) -> Decision {
    if actor_id == owner_id {
        Decision::Allow
    } else {
        Decision::Forbidden
    }
}

/// Fails unless `identity` owns the resource
pub fn require_ownership(identity: &Identity, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    match authorize_mutation(identity.user_id, resource_owner_id) {
        Decision::Allow => Ok(()),
        Decision::Forbidden => {
            debug!(
                user_id = %identity.user_id,
                owner_id = %resource_owner_id,
                "Forbidden mutation"
            );
            Err(AuthzError::Forbidden)
        }
    }
}

/// Resolves the owner of a resource about to be created
///
/// An unset author defaults to the caller. Creating on behalf of anyone else
/// is forbidden.
pub fn authorize_create(identity: &Identity, requested_author: Option<Uuid>) -> Result<Uuid, AuthzError> {
    let owner_id = requested_author.unwrap_or(identity.user_id);
    require_ownership(identity, owner_id)?;
    Ok(owner_id)
}
