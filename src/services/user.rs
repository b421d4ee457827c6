use std::sync::Arc;

use color_eyre::eyre::{Report, Result, WrapErr};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::database::Database;
use crate::entities;
use crate::error::ApiError;
use crate::services::auth::AuthService;

pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<entities::user::Model> {
        entities::user::Entity::find_by_id(user_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user")?
            .ok_or_else(|| Report::new(ApiError::NotFound("user")))
    }

    pub async fn register(
        &self,
        auth: &AuthService,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<entities::user::Model> {
        if username.trim().is_empty() {
            return Err(ApiError::Invalid("Username must not be empty").into());
        }
        if password.is_empty() {
            return Err(ApiError::Invalid("Password must not be empty").into());
        }

        let existing = entities::user::Entity::find()
            .filter(entities::user::Column::Username.eq(username))
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to check for existing user")?;

        if existing.is_some() {
            return Err(ApiError::Invalid("Username is already taken").into());
        }

        let user = entities::user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.map(|e| e.to_string())),
            password_hash: Set(auth.hash_password(password)?),
            ..entities::user::ActiveModel::new()
        };

        let model = user
            .insert(&self.db.conn)
            .await
            .wrap_err("Failed to create user")?;

        tracing::info!(user_id = model.id, username = %model.username, "Registered user");

        Ok(model)
    }

    /// The user's stored remote session cookie, required by every proxied
    /// call. Absent until the first successful sync.
    pub async fn netease_cookie(&self, user_id: i64) -> Result<String> {
        let user = self.get_user(user_id).await?;

        user.netease_cookie
            .filter(|cookie| !cookie.trim().is_empty())
            .ok_or_else(|| Report::new(ApiError::MissingCredential))
    }

    /// Check credentials and issue a token on success.
    pub async fn login(
        &self,
        auth: &AuthService,
        username: &str,
        password: &str,
    ) -> Result<(entities::user::Model, String)> {
        let user = entities::user::Entity::find()
            .filter(entities::user::Column::Username.eq(username))
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user")?
            .ok_or_else(|| Report::new(ApiError::Invalid("Invalid username or password")))?;

        if !auth.verify_password(password, &user.password_hash)? {
            return Err(ApiError::Invalid("Invalid username or password").into());
        }

        let token = auth.create_token(user.id)?;

        Ok((user, token))
    }
}
