use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "songs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Remote song id. Songs are deduplicated globally on this column.
    #[sea_orm(unique)]
    pub netease_id: String,
    pub name: String,
    /// All credited artists in one `/`-delimited string, as the remote
    /// service reports them.
    pub artists: String,
    pub album: Option<String>,
    /// The remote `dt` field is milliseconds. Converted to a clock string
    /// only when rendering exports.
    pub duration_ms: Option<i64>,
    pub cover_url: Option<String>,
    pub mp3_url: Option<String>,
    pub lyrics: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,

    #[sea_orm(has_many, via = "playlist_song")]
    pub playlists: HasMany<super::playlist::Entity>,
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            created_at: Set(now),
            updated_at: Set(now),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(chrono::Utc::now().timestamp());
        }
        Ok(self)
    }
}
