//! Submitted form payloads and their validation.
//!
//! Every field is optional at the extractor level so a sloppy submission
//! still reaches the handler, which reports it through a failure flash.

use chrono::{DateTime, NaiveDateTime};
use sea_orm::ActiveValue::Set;
use serde::Deserialize;
use thiserror::Error;

use gigbook_db::entities::{artist, show, venue};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is not a valid id: {value:?}")]
    InvalidId { field: &'static str, value: String },

    #[error("start_time is not a valid date and time: {0:?}")]
    InvalidStartTime(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub search_term: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_talent: Option<String>,
    pub seeking_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub image_link: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_venue: Option<String>,
    pub seeking_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowInput {
    pub venue_id: i32,
    pub artist_id: i32,
    pub start_time: NaiveDateTime,
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Missing(field));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A checkbox is ticked when it was submitted with any value except an empty
/// one or `false`.
pub fn checkbox(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(v) => !v.is_empty() && !v.eq_ignore_ascii_case("false"),
        None => false,
    }
}

fn parse_id(value: &str, field: &'static str) -> Result<i32, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing(field));
    }
    trimmed.parse().map_err(|_| FormError::InvalidId {
        field,
        value: value.to_string(),
    })
}

const START_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a submitted start time. Offsets are folded into UTC; times without
/// an offset are taken as UTC already.
pub fn parse_start_time(value: &str) -> Result<NaiveDateTime, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing("start_time"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| FormError::InvalidStartTime(value.to_string()))
}

impl VenueForm {
    pub fn validate(self) -> Result<VenueInput, FormError> {
        Ok(VenueInput {
            name: required(&self.name, "name")?,
            city: required(&self.city, "city")?,
            state: required(&self.state, "state")?,
            address: required(&self.address, "address")?,
            phone: optional(&self.phone),
            image_link: optional(&self.image_link),
            facebook_link: optional(&self.facebook_link),
            website_link: optional(&self.website_link),
            seeking_talent: checkbox(self.seeking_talent.as_deref()),
            seeking_description: optional(&self.seeking_description),
            genres: self.genres,
        })
    }
}

impl ArtistForm {
    pub fn validate(self) -> Result<ArtistInput, FormError> {
        Ok(ArtistInput {
            name: required(&self.name, "name")?,
            city: required(&self.city, "city")?,
            state: required(&self.state, "state")?,
            phone: optional(&self.phone),
            image_link: optional(&self.image_link),
            facebook_link: optional(&self.facebook_link),
            website_link: optional(&self.website_link),
            seeking_venue: checkbox(self.seeking_venue.as_deref()),
            seeking_description: optional(&self.seeking_description),
            genres: self.genres,
        })
    }
}

impl ShowForm {
    pub fn validate(self) -> Result<ShowInput, FormError> {
        Ok(ShowInput {
            venue_id: parse_id(&self.venue_id, "venue_id")?,
            artist_id: parse_id(&self.artist_id, "artist_id")?,
            start_time: parse_start_time(&self.start_time)?,
        })
    }
}

impl VenueInput {
    /// Write the submitted fields onto `model`, handing back the genre names
    /// still to be resolved.
    pub fn apply(self, model: &mut venue::ActiveModel) -> Vec<String> {
        model.name = Set(self.name);
        model.city = Set(self.city);
        model.state = Set(self.state);
        model.address = Set(self.address);
        model.phone = Set(self.phone);
        model.image_link = Set(self.image_link);
        model.facebook_link = Set(self.facebook_link);
        model.website_link = Set(self.website_link);
        model.seeking_talent = Set(self.seeking_talent);
        model.seeking_description = Set(self.seeking_description);
        self.genres
    }
}

impl ArtistInput {
    pub fn apply(self, model: &mut artist::ActiveModel) -> Vec<String> {
        model.name = Set(self.name);
        model.city = Set(self.city);
        model.state = Set(self.state);
        model.phone = Set(self.phone);
        model.image_link = Set(self.image_link);
        model.facebook_link = Set(self.facebook_link);
        model.website_link = Set(self.website_link);
        model.seeking_venue = Set(self.seeking_venue);
        model.seeking_description = Set(self.seeking_description);
        self.genres
    }
}

impl From<ShowInput> for show::ActiveModel {
    fn from(input: ShowInput) -> Self {
        show::ActiveModel {
            venue_id: Set(input.venue_id),
            artist_id: Set(input.artist_id),
            start_time: Set(input.start_time),
            ..Default::default()
        }
    }
}
