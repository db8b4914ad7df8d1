/// Credential vault
///
/// Registration and login over any [`AccountStore`]. Hashing and verification
/// run on the blocking thread pool; Argon2 at these parameters is far too
/// slow for an async worker thread.
///
/// # Example
///
/// ```
/// use frengine_shared::auth::{password::PasswordPolicy, vault};
/// use frengine_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), vault::VaultError> {
/// let store = MemoryStore::new();
/// let policy = PasswordPolicy::default();
///
/// vault::register(&store, &policy, "alice", "correct horse", "correct horse").await?;
/// let user = vault::verify_login(&store, "alice", "correct horse").await?;
/// assert_eq!(user.name, "alice");
/// # Ok(())
/// # }
/// ```

use tracing::{debug, info};

use super::password::{self, PasswordError, PasswordPolicy};
use crate::models::account::User;
use crate::store::{AccountStore, StoreError};

/// Error type for vault operations
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Input rejected before touching storage
    #[error("{field}: {message}")]
    Validation {
        /// Offending request field
        field: &'static str,
        message: String,
    },

    /// An account with this name already exists
    #[error("Account name already taken")]
    AlreadyExists,

    /// No account with this name
    #[error("Account not found")]
    NotFound,

    /// The password does not match the stored hash
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// Hashing or verification failure
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl From<StoreError> for VaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => VaultError::AlreadyExists,
            other => VaultError::Storage(other),
        }
    }
}

/// Checks a registration request without touching storage
///
/// Rejects an empty name or password, a confirmation that differs from the
/// password, and passwords that fail `policy`.
pub fn validate_registration(
    policy: &PasswordPolicy,
    name: &str,
    password: &str,
    confirmation: &str,
) -> Result<(), VaultError> {
    let invalid = |field, message: &str| VaultError::Validation {
        field,
        message: message.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name", "Name must not be empty"));
    }

    if password.is_empty() {
        return Err(invalid("password", "Password must not be empty"));
    }

    if password != confirmation {
        return Err(invalid("password2", "Passwords do not match"));
    }

    policy
        .check(password)
        .map_err(|message| VaultError::Validation { field: "password", message })
}

/// Registers a new account
///
/// # Errors
///
/// - `Validation` if [`validate_registration`] fails
/// - `AlreadyExists` if the name is taken; the existing account is untouched
/// - `Storage` / `Password` on backend or hashing failure
pub async fn register<S>(
    store: &S,
    policy: &PasswordPolicy,
    name: &str,
    password: &str,
    confirmation: &str,
) -> Result<User, VaultError>
where
    S: AccountStore + ?Sized,
{
    validate_registration(policy, name, password, confirmation)?;

    let owned = password.to_string();
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&owned))
        .await
        .map_err(|e| PasswordError::HashError(format!("Hashing task failed: {}", e)))??;

    let account = store.insert_account(name, &hash).await.map_err(|e| {
        if matches!(e, StoreError::UniqueViolation(_)) {
            debug!(name, "Registration rejected: name taken");
        }
        VaultError::from(e)
    })?;

    info!(user_id = %account.id, "Registered account");

    Ok(User::from(&account))
}

/// Verifies a login attempt
///
/// A missing account still pays for one hash verification before
/// `NotFound` is returned, so both failures take the same time.
///
/// # Errors
///
/// - `NotFound` if no account has this name
/// - `InvalidCredentials` if the password does not match
/// - `Storage` / `Password` on backend or hash failure
pub async fn verify_login<S>(store: &S, name: &str, password: &str) -> Result<User, VaultError>
where
    S: AccountStore + ?Sized,
{
    let account = store.find_account_by_name(name).await?;
    let attempt = password.to_string();

    let Some(account) = account else {
        tokio::task::spawn_blocking(move || password::verify_dummy(&attempt))
            .await
            .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?;

        debug!(reason = "not_found", "Login failed");
        return Err(VaultError::NotFound);
    };

    let hash = account.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&attempt, &hash))
        .await
        .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))??;

    if !matches {
        debug!(user_id = %account.id, reason = "invalid_credentials", "Login failed");
        return Err(VaultError::InvalidCredentials);
    }

    Ok(User::from(&account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn policy() -> PasswordPolicy {
        PasswordPolicy::default()
    }

    #[test]
    fn test_validate_registration() {
        let p = policy();
        assert!(validate_registration(&p, "alice", "password1", "password1").is_ok());

        for (name, pw, confirm) in [
            ("", "password1", "password1"),
            ("   ", "password1", "password1"),
            ("alice", "", ""),
            ("alice", "password1", "password2"),
            ("alice", "short", "short"),
        ] {
            assert!(
                matches!(validate_registration(&p, name, pw, confirm), Err(VaultError::Validation { .. })),
                "expected validation failure for {:?}",
                (name, pw, confirm)
            );
        }
    }

    #[test]
    fn test_validate_registration_boundary() {
        let p = policy();
        assert!(validate_registration(&p, "alice", "1234567", "1234567").is_err());
        assert!(validate_registration(&p, "alice", "12345678", "12345678").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();

        let registered = register(&store, &policy(), "alice", "password1", "password1")
            .await
            .unwrap();
        let logged_in = verify_login(&store, "alice", "password1").await.unwrap();

        assert_eq!(registered, logged_in);
        assert_eq!(logged_in.name, "alice");
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_not_missing() {
        let store = MemoryStore::new();
        register(&store, &policy(), "alice", "password1", "password1")
            .await
            .unwrap();

        let result = verify_login(&store, "alice", "password2").await;
        assert!(matches!(result, Err(VaultError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let store = MemoryStore::new();

        let result = verify_login(&store, "nobody", "password1").await;
        assert!(matches!(result, Err(VaultError::NotFound)));
    }

    #[tokio::test]
    async fn test_register_twice_keeps_first_account() {
        let store = MemoryStore::new();
        register(&store, &policy(), "alice", "password1", "password1")
            .await
            .unwrap();
        let original = store.find_account_by_name("alice").await.unwrap().unwrap();

        let second = register(&store, &policy(), "alice", "password2", "password2").await;
        assert!(matches!(second, Err(VaultError::AlreadyExists)));

        let after = store.find_account_by_name("alice").await.unwrap().unwrap();
        assert_eq!(after.id, original.id);
        assert_eq!(after.password_hash, original.password_hash);
        assert!(verify_login(&store, "alice", "password1").await.is_ok());
        assert!(matches!(
            verify_login(&store, "alice", "password2").await,
            Err(VaultError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_validation_happens_before_storage() {
        let store = MemoryStore::new();

        let result = register(&store, &policy(), "alice", "password1", "password9").await;
        assert!(matches!(result, Err(VaultError::Validation { .. })));
        assert!(store.find_account_by_name("alice").await.unwrap().is_none());
    }
}
