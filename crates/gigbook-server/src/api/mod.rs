pub mod artists;
pub mod pages;
pub mod shows;
pub mod venues;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Fixed wire format for show start times.
pub fn format_start_time(start_time: NaiveDateTime) -> String {
    start_time.format("%Y-%m-%dT%H:%M:%S.000Z").to_string()
}

/// One search match, shared by the venue and artist search pages.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub search_term: String,
    pub count: usize,
    pub data: Vec<SearchHit>,
}

impl SearchResults {
    pub fn new(search_term: String, data: Vec<SearchHit>) -> Self {
        Self {
            search_term,
            count: data.len(),
            data,
        }
    }
}

/// Form page for creating a venue or artist.
#[derive(Debug, Serialize)]
pub struct FormPage {
    pub form: &'static str,
    pub genres: Vec<String>,
}
