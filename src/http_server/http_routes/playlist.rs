use std::sync::Arc;

use axum::{
    Json,
    extract::{self, Path, Query, State},
    http::StatusCode,
};

use crate::entities;
use crate::http_server::{auth::AuthUser, error::Report, state::AppState};
use crate::ports::netease::NeteaseApiPlaylist;
use crate::services::playlist::PlaylistService;
use crate::services::sync::PlaylistSyncService;
use crate::services::user::UserService;

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlaylistResponse {
    pub id: i64,
    pub netease_id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub track_count: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&entities::playlist::Model> for PlaylistResponse {
    fn from(playlist: &entities::playlist::Model) -> Self {
        Self {
            id: playlist.id,
            netease_id: playlist.netease_id.clone(),
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            cover_url: playlist.cover_url.clone(),
            track_count: playlist.track_count,
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SongResponse {
    pub id: i64,
    pub netease_id: String,
    pub name: String,
    pub artists: String,
    pub album: Option<String>,
    pub duration_ms: Option<i64>,
    pub cover_url: Option<String>,
}

impl From<&entities::song::Model> for SongResponse {
    fn from(song: &entities::song::Model) -> Self {
        Self {
            id: song.id,
            netease_id: song.netease_id.clone(),
            name: song.name.clone(),
            artists: song.artists.clone(),
            album: song.album.clone(),
            duration_ms: song.duration_ms,
            cover_url: song.cover_url.clone(),
        }
    }
}

/// A remote search hit; nothing here is persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemotePlaylistResponse {
    pub netease_id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub track_count: i32,
}

impl From<NeteaseApiPlaylist> for RemotePlaylistResponse {
    fn from(playlist: NeteaseApiPlaylist) -> Self {
        Self {
            netease_id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            cover_url: playlist.cover_url,
            track_count: playlist.track_count,
        }
    }
}

fn playlist_responses(playlists: &[entities::playlist::Model]) -> Vec<PlaylistResponse> {
    playlists.iter().map(PlaylistResponse::from).collect()
}

#[axum::debug_handler]
pub async fn list_playlists(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<PlaylistResponse>>, Report> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlists = service.user_playlists(auth_user.user_id).await?;

    Ok(Json(playlist_responses(&playlists)))
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SyncInput {
    netease_user_id: String,
    cookie: String,
}

#[axum::debug_handler]
pub async fn sync_playlists(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    extract::Json(input): extract::Json<SyncInput>,
) -> Result<Json<Vec<PlaylistResponse>>, Report> {
    let service = PlaylistSyncService::new(app_state.db.clone(), app_state.netease.clone());
    let playlists = service
        .sync_user_playlists(auth_user.user_id, &input.netease_user_id, &input.cookie)
        .await?;

    Ok(Json(playlist_responses(&playlists)))
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SearchParams {
    keyword: String,
    #[serde(default = "default_search_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_search_limit() -> u32 {
    30
}

#[axum::debug_handler]
pub async fn search_playlists(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RemotePlaylistResponse>>, Report> {
    let cookie = UserService::new(app_state.db.clone())
        .netease_cookie(auth_user.user_id)
        .await?;

    let service = PlaylistSyncService::new(app_state.db.clone(), app_state.netease.clone());
    let playlists = service
        .search_remote_playlists(&params.keyword, params.limit, params.offset, &cookie)
        .await?;

    Ok(Json(
        playlists.into_iter().map(RemotePlaylistResponse::from).collect(),
    ))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlaylistDetailResponse {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    /// Songs as of the last track sync.
    pub songs: Vec<SongResponse>,
}

/// Stored playlist detail, including the cached song set. Use the `/songs`
/// route to refresh from the remote service.
#[axum::debug_handler]
pub async fn get_playlist(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PlaylistDetailResponse>, Report> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlist = service.playlist_for_user(id, auth_user.user_id).await?;
    let songs = service.playlist_songs(playlist.id).await?;

    Ok(Json(PlaylistDetailResponse {
        playlist: PlaylistResponse::from(&playlist),
        songs: songs.iter().map(SongResponse::from).collect(),
    }))
}

/// Refresh the playlist's track list from the remote service using the
/// caller's stored cookie, then return the songs.
#[axum::debug_handler]
pub async fn playlist_songs(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<SongResponse>>, Report> {
    let cookie = UserService::new(app_state.db.clone())
        .netease_cookie(auth_user.user_id)
        .await?;

    let service = PlaylistSyncService::new(app_state.db.clone(), app_state.netease.clone());
    let songs = service
        .sync_playlist_tracks(id, auth_user.user_id, &cookie)
        .await?;

    Ok(Json(songs.iter().map(SongResponse::from).collect()))
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ImportInput {
    netease_playlist_id: String,
}

#[axum::debug_handler]
pub async fn import_playlist(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    extract::Json(input): extract::Json<ImportInput>,
) -> Result<Json<PlaylistResponse>, Report> {
    let cookie = UserService::new(app_state.db.clone())
        .netease_cookie(auth_user.user_id)
        .await?;

    let service = PlaylistSyncService::new(app_state.db.clone(), app_state.netease.clone());
    let playlist = service
        .import_playlist(auth_user.user_id, &input.netease_playlist_id, &cookie)
        .await?;

    Ok(Json(PlaylistResponse::from(&playlist)))
}

#[axum::debug_handler]
pub async fn delete_playlist(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, Report> {
    let service = PlaylistService::new(app_state.db.clone());
    service.delete_playlist(id, auth_user.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
