use std::collections::HashSet;
use std::sync::Arc;

use color_eyre::eyre::{Report, Result, WrapErr};
use sea_orm::{
    ActiveModelBehavior, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::database::Database;
use crate::entities;
use crate::error::ApiError;
use crate::ports::netease::{NeteaseApiPlaylist, NeteaseApiTrack, NeteaseClient};

/// Mirrors remote playlists and tracks into the local store.
///
/// Every public operation makes its remote calls first and then applies the
/// resulting writes in a single transaction, so a mid-fetch failure leaves
/// the store untouched (including the user's stored credentials).
pub struct PlaylistSyncService<C: NeteaseClient> {
    db: Arc<Database>,
    client: C,
}

impl<C: NeteaseClient> PlaylistSyncService<C> {
    pub fn new(db: Arc<Database>, client: C) -> Self {
        Self { db, client }
    }

    /// Fetch the user's remote playlists and reconcile them into the store.
    ///
    /// Returns the user's full locally stored playlist set, re-read after the
    /// write, not just the playlists that came back from the remote call.
    pub async fn sync_user_playlists(
        &self,
        user_id: i64,
        netease_user_id: &str,
        cookie: &str,
    ) -> Result<Vec<entities::playlist::Model>> {
        if cookie.trim().is_empty() || netease_user_id.trim().is_empty() {
            return Err(ApiError::MissingCredential.into());
        }

        let user = entities::user::Entity::find_by_id(user_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user")?
            .ok_or_else(|| Report::new(ApiError::NotFound("user")))?;

        let remote_playlists = self.client.user_playlists(netease_user_id, cookie).await?;

        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to begin transaction")?;

        // The credential update shares the transaction with the playlist
        // upserts, so a failed sync never stores a half-applied state.
        {
            let mut model: entities::user::ActiveModel = user.into();
            model.netease_user_id = Set(Some(netease_user_id.to_string()));
            model.netease_cookie = Set(Some(cookie.to_string()));
            model.updated_at = Set(chrono::Utc::now().timestamp());
            entities::user::Entity::update(model)
                .exec(&txn)
                .await
                .wrap_err("Failed to update user credentials")?;
        }

        for playlist in &remote_playlists {
            let saved = self.upsert_playlist(&txn, user_id, playlist).await?;
            tracing::debug!(playlist_id = saved.id, netease_id = %saved.netease_id, "Reconciled playlist");
        }

        txn.commit()
            .await
            .wrap_err("Failed to commit transaction")?;

        tracing::info!(
            user_id,
            synced = remote_playlists.len(),
            "Synced user playlists"
        );

        entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .order_by_asc(entities::playlist::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlists")
    }

    /// Fetch a playlist's current remote track list and replace the local
    /// association set with it. Returns the songs in remote order.
    pub async fn sync_playlist_tracks(
        &self,
        playlist_id: i64,
        user_id: i64,
        cookie: &str,
    ) -> Result<Vec<entities::song::Model>> {
        if cookie.trim().is_empty() {
            return Err(ApiError::MissingCredential.into());
        }

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

        let tracks = self
            .client
            .playlist_tracks(&playlist.netease_id, cookie)
            .await?;

        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to begin transaction")?;

        let songs = self.upsert_tracks(&txn, &tracks).await?;
        self.replace_playlist_songs(&txn, playlist.id, &songs)
            .await?;

        txn.commit()
            .await
            .wrap_err("Failed to commit transaction")?;

        tracing::info!(
            playlist_id = playlist.id,
            songs = songs.len(),
            "Synced playlist tracks"
        );

        Ok(songs)
    }

    /// Mirror a single remote playlist by its remote id. If it is already
    /// stored, the existing row is returned untouched.
    pub async fn import_playlist(
        &self,
        user_id: i64,
        netease_playlist_id: &str,
        cookie: &str,
    ) -> Result<entities::playlist::Model> {
        if cookie.trim().is_empty() {
            return Err(ApiError::MissingCredential.into());
        }

        entities::user::Entity::find_by_id(user_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user")?
            .ok_or_else(|| Report::new(ApiError::NotFound("user")))?;

        if let Some(existing) = entities::playlist::Entity::find()
            .filter(entities::playlist::Column::NeteaseId.eq(netease_playlist_id))
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist")?
        {
            return Ok(existing);
        }

        let detail = self
            .client
            .playlist_detail(netease_playlist_id, cookie)
            .await?;

        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to begin transaction")?;

        let playlist = self.upsert_playlist(&txn, user_id, &detail.playlist).await?;
        let songs = self.upsert_tracks(&txn, &detail.tracks).await?;
        self.replace_playlist_songs(&txn, playlist.id, &songs)
            .await?;

        txn.commit()
            .await
            .wrap_err("Failed to commit transaction")?;

        tracing::info!(
            playlist_id = playlist.id,
            netease_id = %playlist.netease_id,
            "Imported playlist"
        );

        Ok(playlist)
    }

    /// Proxy a remote playlist search. Nothing is persisted.
    pub async fn search_remote_playlists(
        &self,
        keyword: &str,
        limit: u32,
        offset: u32,
        cookie: &str,
    ) -> Result<Vec<NeteaseApiPlaylist>> {
        if cookie.trim().is_empty() {
            return Err(ApiError::MissingCredential.into());
        }

        self.client
            .search_playlists(keyword, limit, offset, cookie)
            .await
    }

    async fn upsert_playlist(
        &self,
        txn: &impl sea_orm::ConnectionTrait,
        user_id: i64,
        playlist: &NeteaseApiPlaylist,
    ) -> Result<entities::playlist::Model> {
        if let Some(existing) = entities::playlist::Entity::find()
            .filter(entities::playlist::Column::NeteaseId.eq(&playlist.id))
            .one(txn)
            .await
            .wrap_err("Failed to fetch saved playlist")?
        {
            // Keep the primary key and song associations; refresh everything
            // the remote side may have edited.
            let mut model: entities::playlist::ActiveModel = existing.into();
            model.user_id = Set(user_id);
            model.name = Set(playlist.name.clone());
            model.description = Set(playlist.description.clone());
            model.cover_url = Set(playlist.cover_url.clone());
            model.track_count = Set(playlist.track_count);
            model.updated_at = Set(chrono::Utc::now().timestamp());

            entities::playlist::Entity::update(model)
                .exec(txn)
                .await
                .wrap_err("Failed to update playlist")
        } else {
            let model = entities::playlist::ActiveModel {
                user_id: Set(user_id),
                netease_id: Set(playlist.id.clone()),
                name: Set(playlist.name.clone()),
                description: Set(playlist.description.clone()),
                cover_url: Set(playlist.cover_url.clone()),
                track_count: Set(playlist.track_count),
                ..entities::playlist::ActiveModel::new()
            };

            entities::playlist::Entity::insert(model)
                .exec_with_returning(txn)
                .await
                .wrap_err("Failed to save playlist")
        }
    }

    /// Upsert each track by remote id, in order, dropping duplicate entries
    /// the remote occasionally lists.
    async fn upsert_tracks(
        &self,
        txn: &impl sea_orm::ConnectionTrait,
        tracks: &[NeteaseApiTrack],
    ) -> Result<Vec<entities::song::Model>> {
        let mut songs = Vec::with_capacity(tracks.len());
        let mut seen = HashSet::new();

        for track in tracks {
            let song = self.upsert_song(txn, track).await?;
            if seen.insert(song.id) {
                songs.push(song);
            }
        }

        Ok(songs)
    }

    async fn upsert_song(
        &self,
        txn: &impl sea_orm::ConnectionTrait,
        track: &NeteaseApiTrack,
    ) -> Result<entities::song::Model> {
        if let Some(existing) = entities::song::Entity::find()
            .filter(entities::song::Column::NeteaseId.eq(&track.id))
            .one(txn)
            .await
            .wrap_err("Failed to fetch saved song")?
        {
            // Song metadata is sticky after the first sync; the row is only
            // reused, never refreshed.
            return Ok(existing);
        }

        let model = entities::song::ActiveModel {
            netease_id: Set(track.id.clone()),
            name: Set(track.name.clone()),
            artists: Set(track.artists.join("/")),
            album: Set(track.album.clone()),
            duration_ms: Set(track.duration_ms),
            cover_url: Set(track.cover_url.clone()),
            ..entities::song::ActiveModel::new()
        };

        entities::song::Entity::insert(model)
            .exec_with_returning(txn)
            .await
            .wrap_err("Failed to save song")
    }

    /// Overwrite the playlist's association rows with exactly the given
    /// songs. Tracks that disappeared remotely disappear here too.
    async fn replace_playlist_songs(
        &self,
        txn: &impl sea_orm::ConnectionTrait,
        playlist_id: i64,
        songs: &[entities::song::Model],
    ) -> Result<()> {
        entities::playlist_song::Entity::delete_many()
            .filter(entities::playlist_song::Column::PlaylistId.eq(playlist_id))
            .exec(txn)
            .await
            .wrap_err("Failed to clear playlist song links")?;

        let now = chrono::Utc::now().timestamp();
        for (position, song) in songs.iter().enumerate() {
            let link = entities::playlist_song::ActiveModel {
                playlist_id: Set(playlist_id),
                song_id: Set(song.id),
                position: Set(position as i32),
                created_at: Set(now),
            };

            entities::playlist_song::Entity::insert(link)
                .exec(txn)
                .await
                .wrap_err("Failed to link song to playlist")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::netease::{MockNeteaseClient, NeteaseApiPlaylistDetail};
    use crate::test_utils::{insert_user, test_db};

    fn api_playlist(id: &str, name: &str, track_count: i32) -> NeteaseApiPlaylist {
        NeteaseApiPlaylist {
            id: id.into(),
            name: name.into(),
            description: Some("desc".into()),
            cover_url: Some("https://p1.music.126.net/cover.jpg".into()),
            track_count,
        }
    }

    fn api_track(id: &str, name: &str) -> NeteaseApiTrack {
        NeteaseApiTrack {
            id: id.into(),
            name: name.into(),
            artists: vec!["Artist A".into(), "Artist B".into()],
            album: Some("Album X".into()),
            cover_url: None,
            duration_ms: Some(326000),
        }
    }

    fn playlist_client(playlists: Vec<NeteaseApiPlaylist>) -> MockNeteaseClient {
        let mut client = MockNeteaseClient::new();
        client
            .expect_user_playlists()
            .returning(move |_, _| Ok(playlists.clone()));
        client
    }

    fn tracks_client(tracks: Vec<NeteaseApiTrack>) -> MockNeteaseClient {
        let mut client = MockNeteaseClient::new();
        client
            .expect_playlist_tracks()
            .returning(move |_, _| Ok(tracks.clone()));
        client
    }

    #[tokio::test]
    async fn test_sync_user_playlists_creates_rows_and_stores_credentials() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let client = playlist_client(vec![
            api_playlist("1001", "Late Night Drive", 42),
            api_playlist("1002", "Morning Run", 7),
        ]);
        let service = PlaylistSyncService::new(db.clone(), client);

        let playlists = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].netease_id, "1001");
        assert_eq!(playlists[0].track_count, 42);

        let stored_user = entities::user::Entity::find_by_id(user.id)
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_user.netease_user_id.as_deref(), Some("remote-42"));
        assert_eq!(stored_user.netease_cookie.as_deref(), Some("MUSIC_U=abc"));
    }

    #[tokio::test]
    async fn test_sync_twice_keeps_primary_keys_stable() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let remote = vec![api_playlist("1001", "Late Night Drive", 42)];

        let service = PlaylistSyncService::new(db.clone(), playlist_client(remote.clone()));
        let first = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        let service = PlaylistSyncService::new(db.clone(), playlist_client(remote));
        let second = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].netease_id, second[0].netease_id);
    }

    #[tokio::test]
    async fn test_sync_refreshes_mutable_fields() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1001", "Old Name", 10)]),
        );
        let first = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1001", "New Name", 11)]),
        );
        let second = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].name, "New Name");
        assert_eq!(second[0].track_count, 11);
    }

    #[tokio::test]
    async fn test_sync_returns_full_stored_set_not_just_fetched() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1001", "First", 1)]),
        );
        service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        // Second sync returns a different remote playlist; the response must
        // still contain both stored rows.
        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1002", "Second", 2)]),
        );
        let playlists = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        assert_eq!(playlists.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_empty_cookie_rejected_before_any_remote_call() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let mut client = MockNeteaseClient::new();
        client.expect_user_playlists().never();

        let service = PlaylistSyncService::new(db, client);
        let err = service
            .sync_user_playlists(user.id, "remote-42", "")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_sync_missing_user_is_not_found() {
        let db = test_db().await;

        let mut client = MockNeteaseClient::new();
        client.expect_user_playlists().never();

        let service = PlaylistSyncService::new(db, client);
        let err = service
            .sync_user_playlists(9999, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_track_sync_dedups_songs_across_playlists() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![
                api_playlist("1001", "First", 1),
                api_playlist("1002", "Second", 1),
            ]),
        );
        let playlists = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        // The same remote song shows up in both playlists.
        for playlist in &playlists {
            let service = PlaylistSyncService::new(
                db.clone(),
                tracks_client(vec![api_track("347230", "海阔天空")]),
            );
            let songs = service
                .sync_playlist_tracks(playlist.id, user.id, "MUSIC_U=abc")
                .await
                .unwrap();
            assert_eq!(songs.len(), 1);
        }

        let songs = entities::song::Entity::find().all(&db.conn).await.unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].netease_id, "347230");

        let links = entities::playlist_song::Entity::find()
            .all(&db.conn)
            .await
            .unwrap();
        assert_eq!(links.len(), 2);
    }

    #[tokio::test]
    async fn test_track_sync_full_replace_on_shrink() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1001", "Mix", 3)]),
        );
        let playlists = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();
        let playlist_id = playlists[0].id;

        let service = PlaylistSyncService::new(
            db.clone(),
            tracks_client(vec![
                api_track("1", "One"),
                api_track("2", "Two"),
                api_track("3", "Three"),
            ]),
        );
        let songs = service
            .sync_playlist_tracks(playlist_id, user.id, "MUSIC_U=abc")
            .await
            .unwrap();
        assert_eq!(songs.len(), 3);

        // The remote list shrank to a single track.
        let service = PlaylistSyncService::new(
            db.clone(),
            tracks_client(vec![api_track("2", "Two")]),
        );
        let songs = service
            .sync_playlist_tracks(playlist_id, user.id, "MUSIC_U=abc")
            .await
            .unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].netease_id, "2");

        let links = entities::playlist_song::Entity::find()
            .filter(entities::playlist_song::Column::PlaylistId.eq(playlist_id))
            .all(&db.conn)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);

        // Unlinked songs are kept in the global song table.
        let all_songs = entities::song::Entity::find().all(&db.conn).await.unwrap();
        assert_eq!(all_songs.len(), 3);
    }

    #[tokio::test]
    async fn test_song_metadata_is_sticky_after_first_sync() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1001", "Mix", 1)]),
        );
        let playlists = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();
        let playlist_id = playlists[0].id;

        let service = PlaylistSyncService::new(
            db.clone(),
            tracks_client(vec![api_track("347230", "Original Name")]),
        );
        service
            .sync_playlist_tracks(playlist_id, user.id, "MUSIC_U=abc")
            .await
            .unwrap();

        let mut renamed = api_track("347230", "Renamed");
        renamed.album = Some("Different Album".into());
        let service = PlaylistSyncService::new(db.clone(), tracks_client(vec![renamed]));
        let songs = service
            .sync_playlist_tracks(playlist_id, user.id, "MUSIC_U=abc")
            .await
            .unwrap();

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].name, "Original Name");
        assert_eq!(songs[0].album.as_deref(), Some("Album X"));
    }

    #[tokio::test]
    async fn test_track_sync_drops_duplicate_remote_entries() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let service = PlaylistSyncService::new(
            db.clone(),
            playlist_client(vec![api_playlist("1001", "Mix", 2)]),
        );
        let playlists = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap();

        let service = PlaylistSyncService::new(
            db.clone(),
            tracks_client(vec![api_track("1", "One"), api_track("1", "One")]),
        );
        let songs = service
            .sync_playlist_tracks(playlists[0].id, user.id, "MUSIC_U=abc")
            .await
            .unwrap();

        assert_eq!(songs.len(), 1);
    }

    #[tokio::test]
    async fn test_import_playlist_is_idempotent() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let detail = NeteaseApiPlaylistDetail {
            playlist: api_playlist("1001", "Imported", 2),
            tracks: vec![api_track("1", "One"), api_track("2", "Two")],
        };

        let mut client = MockNeteaseClient::new();
        let detail_clone = detail.clone();
        client
            .expect_playlist_detail()
            .times(1)
            .returning(move |_, _| Ok(detail_clone.clone()));

        let service = PlaylistSyncService::new(db.clone(), client);
        let imported = service
            .import_playlist(user.id, "1001", "MUSIC_U=abc")
            .await
            .unwrap();
        assert_eq!(imported.name, "Imported");

        let links = entities::playlist_song::Entity::find()
            .all(&db.conn)
            .await
            .unwrap();
        assert_eq!(links.len(), 2);

        // Importing again must not hit the remote API at all.
        let mut client = MockNeteaseClient::new();
        client.expect_playlist_detail().never();
        let service = PlaylistSyncService::new(db.clone(), client);
        let again = service
            .import_playlist(user.id, "1001", "MUSIC_U=abc")
            .await
            .unwrap();
        assert_eq!(again.id, imported.id);
    }

    #[tokio::test]
    async fn test_upstream_failure_aborts_without_writes() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;

        let mut client = MockNeteaseClient::new();
        client.expect_user_playlists().returning(|_, _| {
            Err(ApiError::Upstream("connection reset by peer".into()).into())
        });

        let service = PlaylistSyncService::new(db.clone(), client);
        let err = service
            .sync_user_playlists(user.id, "remote-42", "MUSIC_U=abc")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Upstream(_))
        ));

        // Neither the credentials nor any playlist made it to the store.
        let stored_user = entities::user::Entity::find_by_id(user.id)
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_user.netease_cookie, None);

        let playlists = entities::playlist::Entity::find()
            .all(&db.conn)
            .await
            .unwrap();
        assert!(playlists.is_empty());
    }
}
