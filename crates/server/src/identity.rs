//! Password hashing, token issuing and the `/api/auth` endpoint.

use axum::{Json, extract::State};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    types::auth::{AuthRequest, AuthResponse},
};
use engine::{Account, EngineError};

/// bcrypt cost used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid pepper: {0}")]
    Pepper(#[from] hmac::digest::InvalidLength),
    #[error(transparent)]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Hashes passwords as `bcrypt(hex(hmac_sha256(pepper, password)))`.
///
/// The pepper is a server-wide secret kept out of the database; bcrypt adds
/// the per-user salt and the work factor.
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: String,
    cost: u32,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    pub fn new(pepper: impl Into<String>, cost: u32) -> Self {
        Self {
            pepper: pepper.into(),
            cost,
        }
    }

    fn peppered(&self, password: &str) -> Result<String, PasswordError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.pepper.as_bytes())?;
        mac.update(password.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(self.peppered(password)?, self.cost)?)
    }

    pub fn verify(&self, stored: &str, password: &str) -> Result<bool, PasswordError> {
        Ok(bcrypt::verify(self.peppered(password)?, stored)?)
    }
}

/// What the `sessions` table stores in place of the token itself.
pub(crate) fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

async fn hash_blocking(hasher: &PasswordHasher, password: &str) -> Result<String, ServerError> {
    let hasher = hasher.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|err| ServerError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| ServerError::Internal(format!("failed to hash password: {err}")))
}

async fn verify_blocking(
    hasher: &PasswordHasher,
    stored: &str,
    password: &str,
) -> Result<(), ServerError> {
    let hasher = hasher.clone();
    let stored = stored.to_string();
    let password = password.to_string();
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&stored, &password))
        .await
        .map_err(|err| ServerError::Internal(format!("password check task failed: {err}")))?
        .map_err(|err| ServerError::Internal(format!("failed to check password: {err}")))?;
    if matches {
        Ok(())
    } else {
        Err(ServerError::Unauthorized)
    }
}

/// Verify the password of an existing user, or register a new one.
async fn authenticate(
    state: &ServerState,
    username: &str,
    password: &str,
) -> Result<Account, ServerError> {
    if let Some(credentials) = state.engine.credentials(username).await? {
        return match verify_blocking(&state.passwords, &credentials.password_hash, password).await
        {
            Ok(()) => Ok(credentials.account),
            Err(ServerError::Unauthorized) => {
                tracing::warn!("wrong password for {username}");
                Err(ServerError::Unauthorized)
            }
            Err(err) => Err(err),
        };
    }

    let password_hash = hash_blocking(&state.passwords, password).await?;
    match state.engine.register_account(username, &password_hash).await {
        Ok(account) => Ok(account),
        // Registered concurrently by another request: verify against it.
        Err(EngineError::ExistingKey(_)) => {
            let credentials = state
                .engine
                .credentials(username)
                .await?
                .ok_or(ServerError::Unauthorized)?;
            verify_blocking(&state.passwords, &credentials.password_hash, password).await?;
            Ok(credentials.account)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ServerError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ServerError::Generic(
            "username and password are required".to_string(),
        ));
    }

    let account = authenticate(&state, &payload.username, &payload.password).await?;

    let token = Uuid::new_v4().simple().to_string();
    state
        .engine
        .open_session(&account.id, &token_digest(&token))
        .await?;

    Ok(Json(AuthResponse { token }))
}
