use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::Form;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use super::pages::HomePage;
use super::{format_start_time, FormPage, SearchHit, SearchResults};
use crate::error::{parse_id, AppError, SubmissionError};
use crate::flash::Flash;
use crate::forms::{ArtistForm, SearchForm};
use gigbook_db::entities::{artist, venue};
use gigbook_db::queries::{self, Party, Period};
use gigbook_db::AppState;

#[derive(Debug, Serialize)]
pub struct ArtistListing {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub upcoming_shows_count: u64,
    pub past_shows_count: u64,
}

#[derive(Debug, Serialize)]
pub struct ArtistsPage {
    pub artists: Vec<ArtistListing>,
}

#[derive(Debug, Serialize)]
pub struct ArtistShow {
    pub venue_id: i32,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct ArtistDetail {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtistFormData {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditArtistPage {
    #[serde(flatten)]
    pub form: FormPage,
    pub artist: ArtistFormData,
}

async fn artist_shows(
    db: &DatabaseConnection,
    artist_id: i32,
    period: Period,
    now: NaiveDateTime,
) -> Result<Vec<ArtistShow>, AppError> {
    let rows = queries::shows_in(Party::Artist(artist_id), period, now)
        .find_also_related(venue::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(s, v)| {
            let (venue_name, venue_image_link) =
                v.map(|v| (v.name, v.image_link)).unwrap_or_default();
            ArtistShow {
                venue_id: s.venue_id,
                venue_name,
                venue_image_link,
                start_time: format_start_time(s.start_time),
            }
        })
        .collect())
}

/// GET /artists
pub async fn list_artists(State(state): State<Arc<AppState>>) -> Result<Json<ArtistsPage>, AppError> {
    let now = Utc::now().naive_utc();
    let artists = artist::Entity::find()
        .order_by_asc(artist::Column::Id)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(artists.len());
    for a in artists {
        let genres = queries::artist_genre_names(&state.db, &a).await?;
        let upcoming_shows_count =
            queries::upcoming_shows_count(&state.db, Party::Artist(a.id), now).await?;
        let past_shows_count = queries::past_shows_count(&state.db, Party::Artist(a.id), now).await?;

        data.push(ArtistListing {
            id: a.id,
            name: a.name,
            city: a.city,
            state: a.state,
            phone: a.phone,
            genres,
            image_link: a.image_link,
            website: a.website_link,
            facebook_link: a.facebook_link,
            seeking_venue: a.seeking_venue,
            seeking_description: a.seeking_description,
            upcoming_shows_count,
            past_shows_count,
        });
    }

    Ok(Json(ArtistsPage { artists: data }))
}

/// POST /artists/search
pub async fn search_artists(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResults>, AppError> {
    let now = Utc::now().naive_utc();
    let artists = artist::Entity::find()
        .filter(queries::name_contains(artist::Column::Name, &form.search_term))
        .order_by_asc(artist::Column::Id)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(artists.len());
    for a in artists {
        data.push(SearchHit {
            num_upcoming_shows: queries::upcoming_shows_count(&state.db, Party::Artist(a.id), now)
                .await?,
            id: a.id,
            name: a.name,
        });
    }

    tracing::debug!(term = %form.search_term, hits = data.len(), "artist search");
    Ok(Json(SearchResults::new(form.search_term, data)))
}

/// GET /artists/{id}
pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ArtistDetail>, AppError> {
    let id = parse_id(&id, "artist")?;
    let a = artist::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("artist"))?;

    let now = Utc::now().naive_utc();
    let genres = queries::artist_genre_names(&state.db, &a).await?;
    let past_shows = artist_shows(&state.db, id, Period::Past, now).await?;
    let upcoming_shows = artist_shows(&state.db, id, Period::Upcoming, now).await?;

    Ok(Json(ArtistDetail {
        id: a.id,
        name: a.name,
        genres,
        city: a.city,
        state: a.state,
        phone: a.phone,
        website: a.website_link,
        facebook_link: a.facebook_link,
        seeking_venue: a.seeking_venue,
        seeking_description: a.seeking_description,
        image_link: a.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }))
}

/// GET /artists/create
pub async fn create_artist_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FormPage>, AppError> {
    Ok(Json(FormPage {
        form: "artist",
        genres: queries::all_genre_names(&state.db).await?,
    }))
}

async fn insert_artist(
    db: &DatabaseConnection,
    form: ArtistForm,
) -> Result<artist::Model, SubmissionError> {
    let input = form.validate()?;

    let txn = db.begin().await?;
    let mut model = artist::ActiveModel::new();
    let genre_names = input.apply(&mut model);
    let genres = queries::resolve_genres(&txn, &genre_names).await?;
    let created = model.insert(&txn).await?;
    queries::set_artist_genres(&txn, created.id, &genres).await?;
    txn.commit().await?;

    Ok(created)
}

/// POST /artists/create
pub async fn create_artist(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ArtistForm>,
) -> Json<HomePage> {
    let submitted_name = form.name.trim().to_string();

    let flash = match insert_artist(&state.db, form).await {
        Ok(created) => {
            tracing::info!(artist_id = created.id, name = %created.name, "artist listed");
            Flash::success(format!("Artist {} was successfully listed!", created.name))
        }
        Err(e) => {
            tracing::warn!(error = %e, name = %submitted_name, "artist could not be listed");
            Flash::failure(format!(
                "An error occurred. Artist {submitted_name} could not be listed."
            ))
        }
    };

    Json(HomePage::with_flash(flash))
}

/// GET /artists/{id}/edit
pub async fn edit_artist_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EditArtistPage>, AppError> {
    let id = parse_id(&id, "artist")?;
    let a = artist::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("artist"))?;

    let genres = queries::artist_genre_names(&state.db, &a).await?;
    let choices = queries::all_genre_names(&state.db).await?;

    Ok(Json(EditArtistPage {
        form: FormPage {
            form: "artist",
            genres: choices,
        },
        artist: ArtistFormData {
            id: a.id,
            name: a.name,
            genres,
            city: a.city,
            state: a.state,
            phone: a.phone,
            website: a.website_link,
            facebook_link: a.facebook_link,
            seeking_venue: a.seeking_venue,
            seeking_description: a.seeking_description,
            image_link: a.image_link,
        },
    }))
}

async fn update_artist(
    db: &DatabaseConnection,
    id: i32,
    form: ArtistForm,
) -> Result<(), SubmissionError> {
    let input = form.validate()?;

    let txn = db.begin().await?;
    let existing = artist::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(SubmissionError::MissingReference("artist", id))?;

    let mut model: artist::ActiveModel = existing.into();
    let genre_names = input.apply(&mut model);
    let genres = queries::resolve_genres(&txn, &genre_names).await?;
    model.update(&txn).await?;
    queries::set_artist_genres(&txn, id, &genres).await?;
    txn.commit().await?;

    Ok(())
}

/// POST /artists/{id}/edit
pub async fn edit_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<ArtistForm>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id, "artist")?;

    match update_artist(&state.db, id, form).await {
        Ok(()) => tracing::info!(artist_id = id, "artist updated"),
        Err(e) => tracing::warn!(error = %e, artist_id = id, "artist could not be updated"),
    }

    Ok(Redirect::to(&format!("/artists/{id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_show_serialization() {
        let show = ArtistShow {
            venue_id: 3,
            venue_name: "Park Square Live Music & Coffee".into(),
            venue_image_link: None,
            start_time: "2035-04-01T20:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&show).unwrap();
        assert_eq!(json["venue_id"], 3);
        assert!(json["venue_image_link"].is_null());
        assert_eq!(json["start_time"], "2035-04-01T20:00:00.000Z");
    }

    #[test]
    fn test_edit_page_flattens_form() {
        let page = EditArtistPage {
            form: FormPage {
                form: "artist",
                genres: vec!["Jazz".into()],
            },
            artist: ArtistFormData {
                id: 4,
                name: "Guns N Petals".into(),
                genres: vec![],
                city: "San Francisco".into(),
                state: "CA".into(),
                phone: None,
                website: None,
                facebook_link: None,
                seeking_venue: true,
                seeking_description: None,
                image_link: None,
            },
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["form"], "artist");
        assert_eq!(json["genres"][0], "Jazz");
        assert_eq!(json["artist"]["name"], "Guns N Petals");
    }
}
