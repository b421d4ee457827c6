use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, Response, header},
};
use chrono::Utc;
use color_eyre::eyre::WrapErr;

use crate::error::ApiError;
use crate::http_server::{auth::AuthUser, error::Report, state::AppState};
use crate::services::export;
use crate::services::playlist::PlaylistService;
use crate::services::sync::PlaylistSyncService;
use crate::services::user::UserService;

/// Export one playlist as a text attachment. The track list is refreshed
/// from the remote service first, so the document reflects the current
/// remote state.
#[axum::debug_handler]
pub async fn export_playlist(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response<Body>, Report> {
    let cookie = UserService::new(app_state.db.clone())
        .netease_cookie(auth_user.user_id)
        .await?;

    let playlists = PlaylistService::new(app_state.db.clone());
    let playlist = playlists.playlist_for_user(id, auth_user.user_id).await?;

    let sync = PlaylistSyncService::new(app_state.db.clone(), app_state.netease.clone());
    let songs = sync
        .sync_playlist_tracks(playlist.id, auth_user.user_id, &cookie)
        .await?;

    let exported_at = Utc::now();
    let content = export::render_playlist(&playlist, &songs, exported_at);
    let file_name = export::export_file_name(&playlist.name, exported_at);

    tracing::info!(playlist_id = playlist.id, %file_name, "Exported playlist");

    text_attachment(content, &file_name)
}

/// Export all of the caller's playlists into one text attachment.
#[axum::debug_handler]
pub async fn export_all(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Response<Body>, Report> {
    let users = UserService::new(app_state.db.clone());
    let user = users.get_user(auth_user.user_id).await?;
    let cookie = users.netease_cookie(user.id).await?;

    let playlists = PlaylistService::new(app_state.db.clone())
        .user_playlists(user.id)
        .await?;

    if playlists.is_empty() {
        return Err(ApiError::Invalid("No playlists found for export").into());
    }

    let sync = PlaylistSyncService::new(app_state.db.clone(), app_state.netease.clone());
    let mut sections = Vec::with_capacity(playlists.len());
    for playlist in playlists {
        let songs = sync
            .sync_playlist_tracks(playlist.id, user.id, &cookie)
            .await?;
        sections.push((playlist, songs));
    }

    let exported_at = Utc::now();
    let content = export::render_all_playlists(&user.username, &sections, exported_at);
    let file_name = export::all_export_file_name(exported_at);

    tracing::info!(
        user_id = user.id,
        playlists = sections.len(),
        %file_name,
        "Exported all playlists"
    );

    text_attachment(content, &file_name)
}

fn text_attachment(content: String, file_name: &str) -> Result<Response<Body>, Report> {
    let mut response = Response::new(Body::from(content));

    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
            .wrap_err("Failed to build content disposition header")?,
    );

    Ok(response)
}
