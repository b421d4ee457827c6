use std::sync::Arc;

use axum::{
    Json,
    extract::{self, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::entities;
use crate::http_server::{error::Report, state::AppState};
use crate::services::user::UserService;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterInput {
    username: String,
    email: Option<String>,
    password: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginInput {
    username: String,
    password: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub netease_user_id: Option<String>,
}

impl From<&entities::user::Model> for UserResponse {
    fn from(user: &entities::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            netease_user_id: user.netease_user_id.clone(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[axum::debug_handler]
pub async fn register(
    State(app_state): State<Arc<AppState>>,
    extract::Json(input): extract::Json<RegisterInput>,
) -> Result<impl IntoResponse, Report> {
    let service = UserService::new(app_state.db.clone());
    let user = service
        .register(
            &app_state.auth,
            &input.username,
            input.email.as_deref(),
            &input.password,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

#[axum::debug_handler]
pub async fn login(
    State(app_state): State<Arc<AppState>>,
    extract::Json(input): extract::Json<LoginInput>,
) -> Result<Json<LoginResponse>, Report> {
    let service = UserService::new(app_state.db.clone());
    let (user, token) = service
        .login(&app_state.auth, &input.username, &input.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}
