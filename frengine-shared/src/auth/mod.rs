/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the registration policy
/// - [`vault`]: account registration and login over an [`AccountStore`](crate::store::AccountStore)
/// - [`jwt`]: session token issuance and validation
/// - [`middleware`]: resolves the request's [`Identity`](middleware::Identity)
/// - [`authorization`]: ownership checks gating mutations
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Login Timing**: unknown accounts cost one dummy verification
/// - **JWT Tokens**: HS256, fixed issuer, exact expiry with no leeway
/// - **Request Scope**: identities live in request extensions only
///
/// # Example
///
/// ```
/// use frengine_shared::auth::password::{hash_password, verify_password};
/// use frengine_shared::auth::jwt::TokenIssuer;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let issuer = TokenIssuer::new("secret-key-that-is-at-least-32-bytes", 72);
/// let user_id = Uuid::now_v7();
/// let issued = issuer.issue(user_id)?;
/// assert_eq!(issuer.validate(&issued.token)?, user_id);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod vault;
