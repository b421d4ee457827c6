use chrono::{Duration, Utc};
use color_eyre::eyre::{Result, WrapErr};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Password hashing and JWT issuing/validation.
#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    token_expiry: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (local user id).
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    pub fn new(secret: String, token_expiry_hours: u64) -> Self {
        Self {
            secret,
            token_expiry: Duration::hours(token_expiry_hours as i64),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST).wrap_err("Failed to hash password")
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash).wrap_err("Failed to verify password")
    }

    pub fn create_token(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.token_expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .wrap_err("Failed to encode token")
    }

    /// Validate a token and return the user id it was issued for.
    pub fn verify_token(&self, token: &str) -> Result<i64> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .wrap_err("Invalid token")?;

        token_data
            .claims
            .sub
            .parse::<i64>()
            .wrap_err("Invalid token subject")
    }
}
