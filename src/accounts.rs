use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use std::sync::OnceLock;

use crate::{
    auth::ADMIN_ROLE,
    error::ApiError,
    models::User,
    repository::UserStoreState,
    token::TokenIssuer,
};

/// Salted argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(phc)
}

/// False for a wrong password and for a stored value that is not a valid PHC hash.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// A real argon2 hash, computed once with the same parameters as stored hashes.
/// Verified against on the unknown-username path, where the outcome is discarded.
pub fn unknown_user_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        hash_password("parky-unknown-user").unwrap_or_else(|e| {
            tracing::error!("failed to build unknown-user hash: {}", e);
            String::new()
        })
    })
}

/// Authenticator
///
/// Orchestrates credential verification against the `UserStore` and delegates token
/// creation to the `TokenIssuer`. Values it returns never carry a password.
#[derive(Clone)]
pub struct Authenticator {
    store: UserStoreState,
    issuer: TokenIssuer,
}

impl Authenticator {
    pub fn new(store: UserStoreState, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }

    /// authenticate
    ///
    /// Unknown username and wrong password both return `ApiError::InvalidCredentials`.
    /// On success the identity comes back with `token` set and `password` cleared.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let found = self.store.find_by_username(username).await;

        // An unknown username still pays for one full verification.
        let stored_hash = found.as_ref().map(|user| user.password.clone());

        // argon2 is CPU-bound; keep it off the async workers.
        let candidate = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || {
            let hash = stored_hash.as_deref().unwrap_or_else(|| unknown_user_hash());
            verify_password(hash, &candidate)
        })
        .await
            .unwrap_or_else(|e| {
                tracing::error!("password verification task failed: {:?}", e);
                false
            });

        let mut user = match found {
            Some(user) if verified => user,
            _ => {
                tracing::info!("authentication failed");
                return Err(ApiError::InvalidCredentials);
            }
        };
        user.password.clear();

        let token = self.issuer.issue(&user).map_err(|e| {
            tracing::error!("token issuance failed: {}", e);
            ApiError::Internal
        })?;

        tracing::info!(user_id = user.id, "user authenticated");
        user.token = Some(token);
        Ok(user)
    }

    /// True iff no stored account has exactly this username.
    pub async fn is_unique_username(&self, username: &str) -> bool {
        self.store.find_by_username(username).await.is_none()
    }

    /// register
    ///
    /// Persists a new account with the default role. Does not issue a token.
    /// Uniqueness is the caller's precondition (`is_unique_username`); a duplicate that
    /// slips past it is rejected by the store and reported as `RegistrationFailed`.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let candidate = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&candidate))
            .await
            .map_err(|e| {
                tracing::error!("password hashing task failed: {:?}", e);
                ApiError::RegistrationFailed
            })?
            .map_err(|e| {
                tracing::error!("password hashing failed: {}", e);
                ApiError::RegistrationFailed
            })?;

        let new_user = User {
            id: 0,
            username: username.to_owned(),
            password: password_hash,
            role: ADMIN_ROLE.to_string(),
            token: None,
        };

        let mut created = self
            .store
            .insert(new_user)
            .await
            .ok_or(ApiError::RegistrationFailed)?;

        tracing::info!(user_id = created.id, "user registered");
        created.password.clear();
        Ok(created)
    }
}
