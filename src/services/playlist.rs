use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::{Report, Result, WrapErr};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};

use crate::database::Database;
use crate::entities;
use crate::error::ApiError;

/// Local CRUD over mirrored playlists. Remote-backed operations live in
/// [`crate::services::sync::PlaylistSyncService`].
pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn user_playlists(&self, user_id: i64) -> Result<Vec<entities::playlist::Model>> {
        entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .order_by_asc(entities::playlist::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlists")
    }

    /// Load a playlist and enforce that it belongs to the given user.
    pub async fn playlist_for_user(
        &self,
        playlist_id: i64,
        user_id: i64,
    ) -> Result<entities::playlist::Model> {
        let playlist = entities::playlist::Entity::find_by_id(playlist_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist")?
            .ok_or_else(|| Report::new(ApiError::NotFound("playlist")))?;

        if playlist.user_id != user_id {
            return Err(ApiError::PermissionDenied(
                "You don't have permission to access this playlist",
            )
            .into());
        }

        Ok(playlist)
    }

    /// Songs of a playlist in remote order: load the association rows, then
    /// batch-load the song rows they point at.
    pub async fn playlist_songs(&self, playlist_id: i64) -> Result<Vec<entities::song::Model>> {
        let links = entities::playlist_song::Entity::find()
            .filter(entities::playlist_song::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(entities::playlist_song::Column::Position)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist song links")?;

        let song_ids: Vec<i64> = links.iter().map(|link| link.song_id).collect();

        let songs = entities::song::Entity::find()
            .filter(entities::song::Column::Id.is_in(song_ids.clone()))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch songs")?;

        let mut by_id: HashMap<i64, entities::song::Model> =
            songs.into_iter().map(|song| (song.id, song)).collect();

        Ok(song_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect())
    }

    /// Delete a playlist owned by the user. Association rows go with it; song
    /// rows are shared across playlists and always stay.
    pub async fn delete_playlist(&self, playlist_id: i64, user_id: i64) -> Result<()> {
        let playlist = self.playlist_for_user(playlist_id, user_id).await?;

        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to begin transaction")?;

        entities::playlist_song::Entity::delete_many()
            .filter(entities::playlist_song::Column::PlaylistId.eq(playlist.id))
            .exec(&txn)
            .await
            .wrap_err("Failed to delete playlist song links")?;

        entities::playlist::Entity::delete_by_id(playlist.id)
            .exec(&txn)
            .await
            .wrap_err("Failed to delete playlist")?;

        txn.commit()
            .await
            .wrap_err("Failed to commit transaction")?;

        tracing::info!(playlist_id, user_id, "Deleted playlist");

        Ok(())
    }
}
