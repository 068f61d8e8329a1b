//! Authorization checks
//!
//! Admin-gated operations call [`authorize`] explicitly at their entry
//! point, rather than relying on any view-layer composition. The check is a
//! pure function of the acting profile and the required role.

use crate::types::{Profile, Role, ShopError};

/// Check that `actor` holds at least the required role
///
/// Admins satisfy every requirement; customers satisfy only
/// `Role::Customer`. On denial returns `Forbidden` naming the attempted
/// action.
pub fn authorize(actor: &Profile, required: Role, action: &str) -> Result<(), ShopError> {
    match (required, actor.role) {
        (Role::Customer, _) | (Role::Admin, Role::Admin) => Ok(()),
        (Role::Admin, Role::Customer) => Err(ShopError::forbidden(&actor.user, action)),
    }
}
