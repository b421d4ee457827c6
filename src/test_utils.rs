use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, ConnectionTrait,
    Database as SeaDatabase, EntityTrait,
};

use crate::database::Database;
use crate::entities;

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:?mode=rwc")
        .await
        .unwrap();

    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    migration::Migrator::up(&conn, None).await.unwrap();

    Arc::new(Database { conn })
}

pub async fn insert_user(db: &Database, username: &str) -> entities::user::Model {
    let user = entities::user::ActiveModel {
        username: Set(username.into()),
        email: Set(Some(format!("{username}@example.com"))),
        password_hash: Set("$2b$12$test-hash".into()),
        ..entities::user::ActiveModel::new()
    };
    user.insert(&db.conn).await.unwrap()
}

pub async fn insert_playlist(
    db: &Database,
    user_id: i64,
    netease_id: &str,
    name: &str,
) -> entities::playlist::Model {
    let playlist = entities::playlist::ActiveModel {
        user_id: Set(user_id),
        netease_id: Set(netease_id.into()),
        name: Set(name.into()),
        track_count: Set(0),
        ..entities::playlist::ActiveModel::new()
    };
    playlist.insert(&db.conn).await.unwrap()
}

pub async fn insert_song(db: &Database, netease_id: &str, name: &str) -> entities::song::Model {
    insert_song_with(db, netease_id, name, "Artist A", Some("Album X"), Some(326000)).await
}

pub async fn insert_song_with(
    db: &Database,
    netease_id: &str,
    name: &str,
    artists: &str,
    album: Option<&str>,
    duration_ms: Option<i64>,
) -> entities::song::Model {
    let song = entities::song::ActiveModel {
        netease_id: Set(netease_id.into()),
        name: Set(name.into()),
        artists: Set(artists.into()),
        album: Set(album.map(|a| a.to_string())),
        duration_ms: Set(duration_ms),
        ..entities::song::ActiveModel::new()
    };
    song.insert(&db.conn).await.unwrap()
}

pub async fn link_song(db: &Database, playlist_id: i64, song_id: i64, position: i32) {
    let link = entities::playlist_song::ActiveModel {
        playlist_id: Set(playlist_id),
        song_id: Set(song_id),
        position: Set(position),
        created_at: Set(chrono::Utc::now().timestamp()),
    };
    entities::playlist_song::Entity::insert(link)
        .exec(&db.conn)
        .await
        .unwrap();
}
