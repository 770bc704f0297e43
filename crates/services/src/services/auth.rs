//! Email/password accounts with PBKDF2 hashes and stateless HS256 session tokens.

use std::sync::Arc;

use chrono::Utc;
use db::models::user::{User, UserProfile};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

pub const PBKDF2_ITERATIONS: u32 = 120_000;
const KEY_LEN: usize = 64;
const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email and password are required")]
    MissingCredentials,
    #[error("email is required")]
    MissingEmail,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: Arc<SecretString>,
    pub token_ttl_secs: i64,
    pub iterations: u32,
}

impl AuthSettings {
    pub fn new(jwt_secret: Arc<SecretString>, token_ttl_secs: i64) -> Self {
        Self {
            jwt_secret,
            token_ttl_secs,
            iterations: PBKDF2_ITERATIONS,
        }
    }

    /// Cheaper hashing, for tests.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    fn secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "fullName")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Hex-encoded PBKDF2-HMAC-SHA256 of `password`. The salt is used as its hex text.
pub fn hash_password(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    hex::encode(key)
}

fn new_salt() -> String {
    hex::encode(rand::random::<[u8; SALT_LEN]>())
}

fn verify_password(password: &str, user: &User, iterations: u32) -> bool {
    let candidate = hash_password(password, &user.password_salt, iterations);
    candidate
        .as_bytes()
        .ct_eq(user.password_hash.as_bytes())
        .into()
}

pub struct AuthService {
    pool: SqlitePool,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(pool: SqlitePool, settings: AuthSettings) -> Self {
        Self { pool, settings }
    }

    fn issue(&self, user: &User) -> Result<AuthSession, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            iat,
            exp: iat + self.settings.token_ttl_secs,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.secret_bytes()),
        )?;
        Ok(AuthSession {
            user: UserProfile::from(user),
            token,
            expires_in: self.settings.token_ttl_secs,
        })
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthSession, AuthError> {
        let email = normalize_email(req.email.as_deref());
        let password = req.password.as_deref().filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::MissingCredentials);
        };
        let full_name = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let salt = new_salt();
        let hash = hash_password(password, &salt, self.settings.iterations);
        let user = User::create(&self.pool, Uuid::new_v4(), &email, full_name, &hash, &salt)
            .await
            .map_err(|e| {
                let taken = e
                    .as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false);
                if taken {
                    AuthError::EmailTaken
                } else {
                    AuthError::Database(e)
                }
            })?;

        info!(user_id = %user.id, "Registered user");
        self.issue(&user)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthSession, AuthError> {
        let email = normalize_email(req.email.as_deref());
        let password = req.password.as_deref().filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::MissingCredentials);
        };

        let Some(user) = User::find_by_email(&self.pool, &email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user, self.settings.iterations) {
            warn!(user_id = %user.id, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }
        self.issue(&user)
    }

    pub async fn delete_user(&self, email: Option<&str>) -> Result<(), AuthError> {
        let email = normalize_email(email).ok_or(AuthError::MissingEmail)?;
        if User::delete_by_email(&self.pool, &email).await? == 0 {
            return Err(AuthError::UserNotFound);
        }
        info!("Deleted user account");
        Ok(())
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.secret_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}
