//! Registration, login and bearer token lifecycle

use crate::domain::{LoginInput, NewUser, RegisterInput, StringUuid, User};
use crate::error::{AppError, FieldErrors, Result};
use crate::jwt::JwtManager;
use crate::middleware::auth::AuthUser;
use crate::repository::user::EMAIL_TAKEN;
use crate::repository::{AccessTokenRepository, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub(crate) const BAD_CREDENTIALS: &str = "These credentials do not match our records.";

/// Name recorded on every token row issued by `login`
const TOKEN_NAME: &str = "api-token";

/// Token handed back by a successful login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct AuthService<U: UserRepository, T: AccessTokenRepository> {
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    jwt_manager: JwtManager,
}

impl<U: UserRepository, T: AccessTokenRepository> AuthService<U, T> {
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, jwt_manager: JwtManager) -> Self {
        Self {
            user_repo,
            token_repo,
            jwt_manager,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<User> {
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if !errors.contains("email") && self.user_repo.find_by_email(&input.email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }
        errors.into_result()?;

        let user = self
            .user_repo
            .create(&NewUser {
                name: input.name,
                email: input.email,
                password_hash: hash_password(&input.password)?,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a bearer token backed by a stored row
    pub async fn login(&self, input: LoginInput) -> Result<IssuedToken> {
        input.validate()?;

        let user = match self.user_repo.find_by_email(&input.email).await? {
            Some(user) if verify_password(&input.password, &user.password_hash)? => user,
            _ => return Err(AppError::field("email", BAD_CREDENTIALS)),
        };

        let stored = self.token_repo.create(user.id, TOKEN_NAME).await?;
        let token = self
            .jwt_manager
            .create_access_token(user.id, stored.id, &user.email, &user.name)?;

        info!(user_id = %user.id, token_id = %stored.id, "User logged in");
        Ok(IssuedToken {
            token,
            expires_in: self.jwt_manager.access_token_ttl(),
            user,
        })
    }

    /// Resolve a bearer token to the acting identity.
    ///
    /// The token row must still exist, so a logged-out token is rejected
    /// even while its signature is valid.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let claims = self.jwt_manager.verify_access_token(token)?;
        let user = AuthUser::from_claims(claims)
            .map_err(|_| AppError::BadRequest("Malformed token claims".to_string()))?;

        match self.token_repo.find(user.token_id).await? {
            Some(stored) if stored.user_id == user.user_id => Ok(user),
            _ => Err(AppError::Unauthorized("Token has been revoked".to_string())),
        }
    }

    /// Revoke the token the caller authenticated with
    pub async fn logout(&self, auth: &AuthUser) -> Result<()> {
        self.token_repo.revoke(auth.token_id).await?;
        info!(user_id = %auth.user_id, token_id = %auth.token_id, "User logged out");
        Ok(())
    }

    pub async fn current_user(&self, user_id: StringUuid) -> Result<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against its stored hash
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
