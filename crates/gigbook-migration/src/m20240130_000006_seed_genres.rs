use sea_orm_migration::prelude::*;

/// Migration 6: seed the genre reference list offered by the venue and
/// artist forms.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "INSERT INTO genres (name) VALUES
                ('Alternative'), ('Blues'), ('Classical'), ('Country'),
                ('Electronic'), ('Folk'), ('Funk'), ('Hip-Hop'),
                ('Heavy Metal'), ('Instrumental'), ('Jazz'), ('Musical Theatre'),
                ('Pop'), ('Punk'), ('R&B'), ('Reggae'),
                ('Rock n Roll'), ('Soul'), ('Other')",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DELETE FROM genres")
            .await?;
        Ok(())
    }
}
