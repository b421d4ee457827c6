pub use sea_orm_migration::prelude::*;

mod m20260218_000001_create_tables;
mod m20260304_000002_add_song_media_fields;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260218_000001_create_tables::Migration),
            Box::new(m20260304_000002_add_song_media_fields::Migration),
        ]
    }
}
