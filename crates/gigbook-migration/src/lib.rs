pub use sea_orm_migration::prelude::*;

mod m20240130_000001_create_genres;
mod m20240130_000002_create_venues;
mod m20240130_000003_create_artists;
mod m20240130_000004_create_shows;
mod m20240130_000005_create_genre_links;
mod m20240130_000006_seed_genres;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240130_000001_create_genres::Migration),
            Box::new(m20240130_000002_create_venues::Migration),
            Box::new(m20240130_000003_create_artists::Migration),
            Box::new(m20240130_000004_create_shows::Migration),
            Box::new(m20240130_000005_create_genre_links::Migration),
            Box::new(m20240130_000006_seed_genres::Migration),
        ]
    }
}
