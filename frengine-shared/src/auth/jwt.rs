/// Session token issuance and validation
///
/// Session tokens are stateless JWTs signed with HS256 (HMAC-SHA256) using a
/// process-wide secret. Nothing is stored server-side: a token is valid
/// exactly when its signature verifies and its expiry has not been reached.
/// Rotating the secret therefore invalidates every outstanding token.
///
/// # Security
///
/// - **Algorithm**: HS256 only; tokens claiming any other algorithm are rejected
/// - **Expiration**: fixed horizon from issuance (default 72 hours)
/// - **Validation**: signature, issuer, then `nbf`/`exp` against the clock
/// - **Secret Management**: at least 32 bytes, loaded once at startup
///
/// Expiry is checked here rather than by `jsonwebtoken` so that the boundary
/// is exact (no leeway) and the clock can be injected in tests.
///
/// # Example
///
/// ```
/// use frengine_shared::auth::jwt::TokenIssuer;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new("your-secret-key-at-least-32-bytes-long", 72);
/// let user_id = Uuid::now_v7();
///
/// let token = issuer.issue(user_id)?;
/// assert_eq!(issuer.validate(&token.token)?, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Value of the `iss` claim on every token this service issues
pub const ISSUER: &str = "frengine";

/// Default token lifetime in hours
pub const DEFAULT_TTL_HOURS: i64 = 72;

/// Error type for token operations
///
/// The variants are for logs and tests. Clients only ever learn that their
/// credential was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a structurally valid token (bad encoding, bad JSON, missing claims)
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Signature did not verify, or the token was not issued by this service
    #[error("Token signature is invalid")]
    SignatureInvalid,

    /// The expiry instant has been reached
    #[error("Token has expired")]
    Expired,

    /// The token's `nbf` lies in the future
    #[error("Token is not valid yet")]
    NotYetValid,

    /// Failed to sign a new token
    #[error("Failed to create token: {0}")]
    Encode(String),
}

impl TokenError {
    /// Short stable name of the failure kind, for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired => "expired",
            TokenError::NotYetValid => "not_yet_valid",
            TokenError::Encode(_) => "encode",
        }
    }

    fn from_jwt(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// JWT claims
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "frengine")
/// - `iat`: Issued at timestamp
/// - `nbf`: Not before timestamp (same as `iat`)
/// - `exp`: Expiration timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "frengine"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Builds claims for `user_id` issued at `now` and expiring after `ttl`
    ///
    /// Fails with [`TokenError::Encode`] when the expiry is not representable.
    pub fn new(user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Result<Self, TokenError> {
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encode("token lifetime overflows the clock".to_string()))?;

        Ok(Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires.timestamp(),
        })
    }

    /// Checks the time window at `now`
    ///
    /// A token is expired at and after `exp`.
    pub fn check_window(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        let now = now.timestamp();

        if now >= self.exp {
            return Err(TokenError::Expired);
        }
        if now < self.nbf {
            return Err(TokenError::NotYetValid);
        }

        Ok(())
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWT string for the `Authorization: Bearer` header
    pub token: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens with one immutable secret
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer from the signing secret and the token horizon
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self::with_ttl(secret, Duration::try_hours(ttl_hours).unwrap_or(Duration::MAX))
    }

    /// Creates an issuer with an arbitrary horizon
    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` valid from now until now + horizon
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `now`
    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let claims = Claims::new(user_id, now, self.ttl)?;

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Validates a token and returns the user it identifies
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validates a token as if the current time were `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        Ok(self.decode_claims(token, now)?.sub)
    }

    /// Validates a token and returns its full claim set
    pub fn decode_claims(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::from_jwt)?
            .claims;

        claims.check_window(now)?;

        Ok(claims)
    }
}
