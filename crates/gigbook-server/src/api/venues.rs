use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::Form;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::pages::{HomePage, IndexOutcome};
use super::{format_start_time, FormPage, SearchHit, SearchResults};
use crate::error::{parse_id, AppError, SubmissionError};
use crate::flash::Flash;
use crate::forms::{SearchForm, VenueForm};
use gigbook_db::entities::{artist, show, venue, venue_genre};
use gigbook_db::queries::{self, Party, Period};
use gigbook_db::AppState;

#[derive(Debug, Serialize)]
pub struct VenueSummary {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: u64,
}

/// Venues sharing one (city, state) pair.
#[derive(Debug, Serialize)]
pub struct Area {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueSummary>,
}

#[derive(Debug, Serialize)]
pub struct VenuesPage {
    pub areas: Vec<Area>,
}

#[derive(Debug, Serialize)]
pub struct VenueShow {
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct VenueDetail {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

/// Current field values used to prefill the edit form.
#[derive(Debug, Serialize)]
pub struct VenueFormData {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditVenuePage {
    #[serde(flatten)]
    pub form: FormPage,
    pub venue: VenueFormData,
}

/// Group venues by (city, state). Areas appear in the order their first
/// venue appears; venues keep their input order inside an area.
pub fn group_by_area(venues: Vec<(venue::Model, u64)>) -> Vec<Area> {
    let mut areas: Vec<Area> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for (v, num_upcoming_shows) in venues {
        let key = (v.city.clone(), v.state.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            areas.push(Area {
                city: v.city.clone(),
                state: v.state.clone(),
                venues: Vec::new(),
            });
            areas.len() - 1
        });
        areas[slot].venues.push(VenueSummary {
            id: v.id,
            name: v.name,
            num_upcoming_shows,
        });
    }

    areas
}

async fn venue_shows(
    db: &DatabaseConnection,
    venue_id: i32,
    period: Period,
    now: NaiveDateTime,
) -> Result<Vec<VenueShow>, AppError> {
    let rows = queries::shows_in(Party::Venue(venue_id), period, now)
        .find_also_related(artist::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(s, a)| {
            let (artist_name, artist_image_link) =
                a.map(|a| (a.name, a.image_link)).unwrap_or_default();
            VenueShow {
                artist_id: s.artist_id,
                artist_name,
                artist_image_link,
                start_time: format_start_time(s.start_time),
            }
        })
        .collect())
}

/// GET /venues
pub async fn list_venues(State(state): State<Arc<AppState>>) -> Result<Json<VenuesPage>, AppError> {
    let now = Utc::now().naive_utc();
    let venues = venue::Entity::find()
        .order_by_asc(venue::Column::Id)
        .all(&state.db)
        .await?;

    let mut counted = Vec::with_capacity(venues.len());
    for v in venues {
        let upcoming = queries::upcoming_shows_count(&state.db, Party::Venue(v.id), now).await?;
        counted.push((v, upcoming));
    }

    Ok(Json(VenuesPage {
        areas: group_by_area(counted),
    }))
}

/// POST /venues/search
pub async fn search_venues(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResults>, AppError> {
    let now = Utc::now().naive_utc();
    let venues = venue::Entity::find()
        .filter(queries::name_contains(venue::Column::Name, &form.search_term))
        .order_by_asc(venue::Column::Id)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(venues.len());
    for v in venues {
        data.push(SearchHit {
            num_upcoming_shows: queries::upcoming_shows_count(&state.db, Party::Venue(v.id), now)
                .await?,
            id: v.id,
            name: v.name,
        });
    }

    tracing::debug!(term = %form.search_term, hits = data.len(), "venue search");
    Ok(Json(SearchResults::new(form.search_term, data)))
}

/// GET /venues/{id}
pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VenueDetail>, AppError> {
    let id = parse_id(&id, "venue")?;
    let v = venue::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("venue"))?;

    let now = Utc::now().naive_utc();
    let genres = queries::venue_genre_names(&state.db, &v).await?;
    let past_shows = venue_shows(&state.db, id, Period::Past, now).await?;
    let upcoming_shows = venue_shows(&state.db, id, Period::Upcoming, now).await?;

    Ok(Json(VenueDetail {
        id: v.id,
        name: v.name,
        genres,
        address: v.address,
        city: v.city,
        state: v.state,
        phone: v.phone,
        website: v.website_link,
        facebook_link: v.facebook_link,
        seeking_talent: v.seeking_talent,
        seeking_description: v.seeking_description,
        image_link: v.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }))
}

/// GET /venues/create
pub async fn create_venue_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FormPage>, AppError> {
    Ok(Json(FormPage {
        form: "venue",
        genres: queries::all_genre_names(&state.db).await?,
    }))
}

async fn insert_venue(
    db: &DatabaseConnection,
    form: VenueForm,
) -> Result<venue::Model, SubmissionError> {
    let input = form.validate()?;

    // Dropping `txn` without commit rolls it back.
    let txn = db.begin().await?;
    let mut model = venue::ActiveModel::new();
    let genre_names = input.apply(&mut model);
    let genres = queries::resolve_genres(&txn, &genre_names).await?;
    let created = model.insert(&txn).await?;
    queries::set_venue_genres(&txn, created.id, &genres).await?;
    txn.commit().await?;

    Ok(created)
}

/// POST /venues/create
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    Form(form): Form<VenueForm>,
) -> Json<HomePage> {
    let submitted_name = form.name.trim().to_string();

    let flash = match insert_venue(&state.db, form).await {
        Ok(created) => {
            tracing::info!(venue_id = created.id, name = %created.name, "venue listed");
            Flash::success(format!("Venue {} was successfully listed!", created.name))
        }
        Err(e) => {
            tracing::warn!(error = %e, name = %submitted_name, "venue could not be listed");
            Flash::failure(format!(
                "An error occurred. Venue {submitted_name} could not be listed."
            ))
        }
    };

    Json(HomePage::with_flash(flash))
}

/// Returns the deleted venue's name, or `None` when there was nothing to delete.
async fn remove_venue(db: &DatabaseConnection, id: i32) -> Result<Option<String>, SubmissionError> {
    let txn = db.begin().await?;

    let Some(existing) = venue::Entity::find_by_id(id).one(&txn).await? else {
        return Ok(None);
    };

    // Shows and genre links go with the venue.
    show::Entity::delete_many()
        .filter(show::Column::VenueId.eq(id))
        .exec(&txn)
        .await?;
    venue_genre::Entity::delete_many()
        .filter(venue_genre::Column::VenueId.eq(id))
        .exec(&txn)
        .await?;
    venue::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(Some(existing.name))
}

/// DELETE /venues/{id}
///
/// Always lands back on the index; the outcome travels in the flash.
pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<IndexOutcome> {
    let result = match parse_id(&id, "venue") {
        Ok(id) => remove_venue(&state.db, id).await,
        Err(_) => Ok(None),
    };

    let flash = match result {
        Ok(Some(name)) => {
            tracing::info!(venue_id = %id, %name, "venue deleted");
            Flash::success(format!("Venue {name} was successfully deleted!"))
        }
        Ok(None) => Flash::failure("Venue not found."),
        Err(e) => {
            tracing::error!(error = %e, venue_id = %id, "venue could not be deleted");
            Flash::failure("An error occurred. Venue could not be deleted.")
        }
    };

    Json(IndexOutcome::new(flash))
}

/// GET /venues/{id}/edit
pub async fn edit_venue_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EditVenuePage>, AppError> {
    let id = parse_id(&id, "venue")?;
    let v = venue::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound("venue"))?;

    let genres = queries::venue_genre_names(&state.db, &v).await?;
    let choices = queries::all_genre_names(&state.db).await?;

    Ok(Json(EditVenuePage {
        form: FormPage {
            form: "venue",
            genres: choices,
        },
        venue: VenueFormData {
            id: v.id,
            name: v.name,
            genres,
            address: v.address,
            city: v.city,
            state: v.state,
            phone: v.phone,
            website: v.website_link,
            facebook_link: v.facebook_link,
            seeking_talent: v.seeking_talent,
            seeking_description: v.seeking_description,
            image_link: v.image_link,
        },
    }))
}

async fn update_venue(
    db: &DatabaseConnection,
    id: i32,
    form: VenueForm,
) -> Result<(), SubmissionError> {
    let input = form.validate()?;

    let txn = db.begin().await?;
    let existing = venue::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(SubmissionError::MissingReference("venue", id))?;

    let mut model: venue::ActiveModel = existing.into();
    let genre_names = input.apply(&mut model);
    let genres = queries::resolve_genres(&txn, &genre_names).await?;
    model.update(&txn).await?;
    queries::set_venue_genres(&txn, id, &genres).await?;
    txn.commit().await?;

    Ok(())
}

/// POST /venues/{id}/edit
pub async fn edit_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<VenueForm>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id, "venue")?;

    match update_venue(&state.db, id, form).await {
        Ok(()) => tracing::info!(venue_id = id, "venue updated"),
        Err(e) => tracing::warn!(error = %e, venue_id = id, "venue could not be updated"),
    }

    Ok(Redirect::to(&format!("/venues/{id}")))
}
