//! Query functions behind the listing, search and detail pages.
//!
//! Show counts are never cached: every call compares `start_time` against the
//! `now` the caller passes in. Both comparisons are strict, so a show that
//! starts exactly at `now` is neither past nor upcoming.

use chrono::NaiveDateTime;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};

use crate::entities::{artist, artist_genre, genre, show, venue, venue_genre};

/// The side of a show a query is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Venue(i32),
    Artist(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Past,
    Upcoming,
}

impl Period {
    /// Classify a start time against `now`. `None` when they are equal.
    pub fn of(start_time: NaiveDateTime, now: NaiveDateTime) -> Option<Self> {
        if start_time > now {
            Some(Period::Upcoming)
        } else if start_time < now {
            Some(Period::Past)
        } else {
            None
        }
    }
}

fn show_condition(party: Party, period: Period, now: NaiveDateTime) -> Condition {
    let owner = match party {
        Party::Venue(id) => show::Column::VenueId.eq(id),
        Party::Artist(id) => show::Column::ArtistId.eq(id),
    };
    let window = match period {
        Period::Past => show::Column::StartTime.lt(now),
        Period::Upcoming => show::Column::StartTime.gt(now),
    };
    Condition::all().add(owner).add(window)
}

/// Shows of `party` in `period`, earliest first.
pub fn shows_in(party: Party, period: Period, now: NaiveDateTime) -> Select<show::Entity> {
    show::Entity::find()
        .filter(show_condition(party, period, now))
        .order_by_asc(show::Column::StartTime)
        .order_by_asc(show::Column::Id)
}

pub async fn count_shows<C: ConnectionTrait>(
    db: &C,
    party: Party,
    period: Period,
    now: NaiveDateTime,
) -> Result<u64, DbErr> {
    show::Entity::find()
        .filter(show_condition(party, period, now))
        .count(db)
        .await
}

pub async fn upcoming_shows_count<C: ConnectionTrait>(
    db: &C,
    party: Party,
    now: NaiveDateTime,
) -> Result<u64, DbErr> {
    count_shows(db, party, Period::Upcoming, now).await
}

pub async fn past_shows_count<C: ConnectionTrait>(
    db: &C,
    party: Party,
    now: NaiveDateTime,
) -> Result<u64, DbErr> {
    count_shows(db, party, Period::Past, now).await
}

/// Case-insensitive substring match on `column`. The term is used as typed,
/// surrounding whitespace included, and LIKE wildcards in it match literally.
/// An empty term matches every row.
pub fn name_contains<C: ColumnTrait + 'static>(column: C, term: &str) -> SimpleExpr {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}

/// Look up genres by name, ignoring case. Names without a matching row are
/// dropped; spellings that differ only in case resolve to the same row.
pub async fn resolve_genres<C: ConnectionTrait>(
    db: &C,
    names: &[String],
) -> Result<Vec<genre::Model>, DbErr> {
    let mut wanted: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    wanted.sort();
    wanted.dedup();

    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    genre::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(genre::Column::Name))).is_in(wanted))
        .order_by_asc(genre::Column::Id)
        .all(db)
        .await
}

pub async fn all_genre_names<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbErr> {
    Ok(genre::Entity::find()
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect())
}

pub async fn venue_genre_names<C: ConnectionTrait>(
    db: &C,
    venue: &venue::Model,
) -> Result<Vec<String>, DbErr> {
    Ok(venue
        .find_related(genre::Entity)
        .order_by_asc(genre::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect())
}

pub async fn artist_genre_names<C: ConnectionTrait>(
    db: &C,
    artist: &artist::Model,
) -> Result<Vec<String>, DbErr> {
    Ok(artist
        .find_related(genre::Entity)
        .order_by_asc(genre::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect())
}

/// Replace the venue's genre links with `genres`.
pub async fn set_venue_genres<C: ConnectionTrait>(
    db: &C,
    venue_id: i32,
    genres: &[genre::Model],
) -> Result<(), DbErr> {
    venue_genre::Entity::delete_many()
        .filter(venue_genre::Column::VenueId.eq(venue_id))
        .exec(db)
        .await?;

    if genres.is_empty() {
        return Ok(());
    }

    let links = genres.iter().map(|g| venue_genre::ActiveModel {
        venue_id: Set(venue_id),
        genre_id: Set(g.id),
    });
    venue_genre::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Replace the artist's genre links with `genres`.
pub async fn set_artist_genres<C: ConnectionTrait>(
    db: &C,
    artist_id: i32,
    genres: &[genre::Model],
) -> Result<(), DbErr> {
    artist_genre::Entity::delete_many()
        .filter(artist_genre::Column::ArtistId.eq(artist_id))
        .exec(db)
        .await?;

    if genres.is_empty() {
        return Ok(());
    }

    let links = genres.iter().map(|g| artist_genre::ActiveModel {
        artist_id: Set(artist_id),
        genre_id: Set(g.id),
    });
    artist_genre::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect, DatabaseConfig};
    use chrono::{Duration, Utc};
    use gigbook_migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, DatabaseConnection};

    async fn test_db() -> DatabaseConnection {
        let db = connect(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_venue(db: &DatabaseConnection, name: &str) -> venue::Model {
        venue::ActiveModel {
            name: Set(name.to_string()),
            city: Set("San Francisco".into()),
            state: Set("CA".into()),
            address: Set("1015 Folsom Street".into()),
            phone: Set(None),
            image_link: Set(None),
            facebook_link: Set(None),
            website_link: Set(None),
            seeking_talent: Set(false),
            seeking_description: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn insert_artist(db: &DatabaseConnection, name: &str) -> artist::Model {
        artist::ActiveModel {
            name: Set(name.to_string()),
            city: Set("San Francisco".into()),
            state: Set("CA".into()),
            phone: Set(None),
            image_link: Set(None),
            facebook_link: Set(None),
            website_link: Set(None),
            seeking_venue: Set(false),
            seeking_description: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn insert_show(db: &DatabaseConnection, venue_id: i32, artist_id: i32, at: NaiveDateTime) {
        show::ActiveModel {
            venue_id: Set(venue_id),
            artist_id: Set(artist_id),
            start_time: Set(at),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[test]
    fn test_period_of_is_strict() {
        let now = Utc::now().naive_utc();
        assert_eq!(Period::of(now + Duration::seconds(1), now), Some(Period::Upcoming));
        assert_eq!(Period::of(now - Duration::seconds(1), now), Some(Period::Past));
        assert_eq!(Period::of(now, now), None);
    }

    #[tokio::test]
    async fn test_counts_split_past_and_upcoming() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop").await;
        let artist = insert_artist(&db, "Guns N Petals").await;
        let now = Utc::now().naive_utc();

        insert_show(&db, venue.id, artist.id, now - Duration::days(3)).await;
        insert_show(&db, venue.id, artist.id, now + Duration::days(1)).await;
        insert_show(&db, venue.id, artist.id, now + Duration::days(2)).await;

        assert_eq!(upcoming_shows_count(&db, Party::Venue(venue.id), now).await.unwrap(), 2);
        assert_eq!(past_shows_count(&db, Party::Venue(venue.id), now).await.unwrap(), 1);
        assert_eq!(upcoming_shows_count(&db, Party::Artist(artist.id), now).await.unwrap(), 2);
        assert_eq!(past_shows_count(&db, Party::Artist(artist.id), now).await.unwrap(), 1);

        let upcoming = shows_in(Party::Venue(venue.id), Period::Upcoming, now)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming[0].start_time < upcoming[1].start_time);
    }

    #[tokio::test]
    async fn test_counts_are_scoped_to_party() {
        let db = test_db().await;
        let hop = insert_venue(&db, "The Musical Hop").await;
        let park = insert_venue(&db, "Park Square Live Music & Coffee").await;
        let artist = insert_artist(&db, "Matt Quevedo").await;
        let now = Utc::now().naive_utc();

        insert_show(&db, park.id, artist.id, now + Duration::hours(5)).await;

        assert_eq!(upcoming_shows_count(&db, Party::Venue(hop.id), now).await.unwrap(), 0);
        assert_eq!(upcoming_shows_count(&db, Party::Venue(park.id), now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_name_contains_is_case_insensitive() {
        let db = test_db().await;
        insert_venue(&db, "The Musical Hop").await;
        insert_venue(&db, "The Dueling Pianos Bar").await;

        let hits = venue::Entity::find()
            .filter(name_contains(venue::Column::Name, "HOP"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "The Musical Hop");

        let all = venue::Entity::find()
            .filter(name_contains(venue::Column::Name, ""))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_name_contains_treats_wildcards_literally() {
        let db = test_db().await;
        insert_venue(&db, "The Musical Hop").await;

        let hits = venue::Entity::find()
            .filter(name_contains(venue::Column::Name, "%"))
            .all(&db)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_name_contains_keeps_surrounding_whitespace() {
        let db = test_db().await;
        insert_venue(&db, "The Musical Hop").await;
        insert_venue(&db, "The Dueling Pianos Bar").await;

        let trailing = venue::Entity::find()
            .filter(name_contains(venue::Column::Name, "hop "))
            .all(&db)
            .await
            .unwrap();
        assert!(trailing.is_empty());

        let blank = venue::Entity::find()
            .filter(name_contains(venue::Column::Name, "   "))
            .all(&db)
            .await
            .unwrap();
        assert!(blank.is_empty());

        let inner = venue::Entity::find()
            .filter(name_contains(venue::Column::Name, "musical hop"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(inner.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_genres_ignores_case_and_unknown_names() {
        let db = test_db().await;
        let genres = resolve_genres(
            &db,
            &["Jazz".to_string(), "JAZZ".to_string(), "Polka Dubstep".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name, "Jazz");

        assert!(resolve_genres(&db, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_venue_genres_replaces_links() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop").await;

        let first = resolve_genres(&db, &["jazz".into(), "swing".into()]).await.unwrap();
        set_venue_genres(&db, venue.id, &first).await.unwrap();
        assert_eq!(venue_genre_names(&db, &venue).await.unwrap().len(), 1);

        let second = resolve_genres(&db, &["Folk".into(), "Classical".into()]).await.unwrap();
        set_venue_genres(&db, venue.id, &second).await.unwrap();
        let mut names = venue_genre_names(&db, &venue).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["Classical".to_string(), "Folk".to_string()]);
    }

    #[tokio::test]
    async fn test_set_artist_genres_links_resolved_rows() {
        let db = test_db().await;
        let artist = insert_artist(&db, "The Wild Sax Band").await;

        let genres = resolve_genres(&db, &["jazz".into(), "classical".into()]).await.unwrap();
        set_artist_genres(&db, artist.id, &genres).await.unwrap();

        let names = artist_genre_names(&db, &artist).await.unwrap();
        assert_eq!(names, vec!["Classical".to_string(), "Jazz".to_string()]);
    }
}
