use async_trait::async_trait;
use sea_orm::entity::prelude::*;

/// Many-to-many relationship between playlists and songs. Rows are replaced
/// wholesale on every track sync; `position` preserves the remote ordering.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "playlist_songs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub playlist_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub song_id: i64,
    pub position: i32,
    pub created_at: i64,

    #[sea_orm(belongs_to, from = "playlist_id", to = "id")]
    pub playlist: BelongsTo<super::playlist::Entity>,
    #[sea_orm(belongs_to, from = "song_id", to = "id")]
    pub song: BelongsTo<super::song::Entity>,
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
