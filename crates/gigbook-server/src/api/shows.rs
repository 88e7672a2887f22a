use axum::{extract::State, Json};
use axum_extra::extract::Form;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, TransactionTrait};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::format_start_time;
use super::pages::HomePage;
use crate::error::{AppError, SubmissionError};
use crate::flash::Flash;
use crate::forms::ShowForm;
use gigbook_db::entities::{artist, show, venue};
use gigbook_db::AppState;

#[derive(Debug, Serialize)]
pub struct ShowListing {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct ShowsPage {
    pub shows: Vec<ShowListing>,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub id: i32,
    pub name: String,
}

/// Form page for booking a show; lists who and where can be booked.
#[derive(Debug, Serialize)]
pub struct ShowFormPage {
    pub form: &'static str,
    pub venues: Vec<Choice>,
    pub artists: Vec<Choice>,
}

/// GET /shows
pub async fn list_shows(State(state): State<Arc<AppState>>) -> Result<Json<ShowsPage>, AppError> {
    let rows = show::Entity::find()
        .order_by_asc(show::Column::Id)
        .find_also_related(venue::Entity)
        .all(&state.db)
        .await?;

    let artists: HashMap<i32, artist::Model> = artist::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let shows = rows
        .into_iter()
        .map(|(s, v)| {
            let a = artists.get(&s.artist_id);
            ShowListing {
                venue_id: s.venue_id,
                venue_name: v.map(|v| v.name).unwrap_or_default(),
                artist_id: s.artist_id,
                artist_name: a.map(|a| a.name.clone()).unwrap_or_default(),
                artist_image_link: a.and_then(|a| a.image_link.clone()),
                start_time: format_start_time(s.start_time),
            }
        })
        .collect();

    Ok(Json(ShowsPage { shows }))
}

/// GET /shows/create
pub async fn create_show_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShowFormPage>, AppError> {
    let venues = venue::Entity::find()
        .order_by_asc(venue::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| Choice { id: v.id, name: v.name })
        .collect();
    let artists = artist::Entity::find()
        .order_by_asc(artist::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| Choice { id: a.id, name: a.name })
        .collect();

    Ok(Json(ShowFormPage {
        form: "show",
        venues,
        artists,
    }))
}

async fn insert_show(db: &DatabaseConnection, form: ShowForm) -> Result<show::Model, SubmissionError> {
    let input = form.validate()?;

    let txn = db.begin().await?;
    if venue::Entity::find_by_id(input.venue_id).one(&txn).await?.is_none() {
        return Err(SubmissionError::MissingReference("venue", input.venue_id));
    }
    if artist::Entity::find_by_id(input.artist_id).one(&txn).await?.is_none() {
        return Err(SubmissionError::MissingReference("artist", input.artist_id));
    }

    let created = show::ActiveModel::from(input).insert(&txn).await?;
    txn.commit().await?;

    Ok(created)
}

/// POST /shows/create
pub async fn create_show(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ShowForm>,
) -> Json<HomePage> {
    let flash = match insert_show(&state.db, form).await {
        Ok(created) => {
            tracing::info!(
                show_id = created.id,
                venue_id = created.venue_id,
                artist_id = created.artist_id,
                "show listed"
            );
            Flash::success("Show was successfully listed!")
        }
        Err(e) => {
            tracing::warn!(error = %e, "show could not be listed");
            Flash::failure("An error occurred. Show could not be listed.")
        }
    };

    Json(HomePage::with_flash(flash))
}
