use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table("users")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("username").string().not_null().unique_key())
                    .col(ColumnDef::new("email").string())
                    .col(ColumnDef::new("password_hash").string().not_null())
                    .col(ColumnDef::new("netease_user_id").string())
                    .col(ColumnDef::new("netease_cookie").text())
                    .col(ColumnDef::new("created_at").big_integer().not_null())
                    .col(ColumnDef::new("updated_at").big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Create playlists table
        manager
            .create_table(
                Table::create()
                    .table("playlists")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("user_id").integer().not_null())
                    .col(
                        ColumnDef::new("netease_id")
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new("name").string().not_null())
                    .col(ColumnDef::new("description").text())
                    .col(ColumnDef::new("cover_url").string())
                    .col(ColumnDef::new("track_count").integer().not_null())
                    .col(ColumnDef::new("created_at").big_integer().not_null())
                    .col(ColumnDef::new("updated_at").big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlists_user_id")
                            .from("playlists", "user_id")
                            .to("users", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create songs table
        manager
            .create_table(
                Table::create()
                    .table("songs")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new("netease_id")
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new("name").string().not_null())
                    .col(ColumnDef::new("artists").string().not_null())
                    .col(ColumnDef::new("album").string())
                    .col(ColumnDef::new("duration_ms").big_integer())
                    .col(ColumnDef::new("cover_url").string())
                    .col(ColumnDef::new("created_at").big_integer().not_null())
                    .col(ColumnDef::new("updated_at").big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Create playlist_songs junction table
        manager
            .create_table(
                Table::create()
                    .table("playlist_songs")
                    .if_not_exists()
                    .col(ColumnDef::new("playlist_id").integer().not_null())
                    .col(ColumnDef::new("song_id").integer().not_null())
                    .col(ColumnDef::new("position").integer().not_null())
                    .col(ColumnDef::new("created_at").big_integer().not_null())
                    .primary_key(Index::create().col("playlist_id").col("song_id"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_songs_playlist_id")
                            .from("playlist_songs", "playlist_id")
                            .to("playlists", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_songs_song_id")
                            .from("playlist_songs", "song_id")
                            .to("songs", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("playlist_songs").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table("songs").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table("playlists").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table("users").to_owned())
            .await?;

        Ok(())
    }
}
