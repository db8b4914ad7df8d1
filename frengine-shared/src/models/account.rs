/// Account model
///
/// An account is created once at registration and read on every login. It is
/// never mutated afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored account row
///
/// Passwords are stored as Argon2id hashes, never in plaintext. This type is
/// deliberately not `Serialize`; use [`User`] for anything that leaves the
/// server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v7)
    pub id: Uuid,

    /// Unique display/login name
    pub name: String,

    /// Argon2id password hash in PHC string format
    pub password_hash: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

/// Public view of an account
///
/// Returned on login and embedded as the author of projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account ID
    pub id: Uuid,

    /// Display name
    pub name: String,
}

impl From<&Account> for User {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
        }
    }
}
