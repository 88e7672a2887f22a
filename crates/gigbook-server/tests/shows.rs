mod common;

use axum::http::StatusCode;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;

#[tokio::test]
async fn test_create_show_flashes_success() {
    let server = common::test_server().await;

    common::create_venue(&server, "The Musical Hop", "San Francisco", "CA", &[]).await;
    common::create_artist(&server, "Guns N Petals", &[]).await;

    let resp = common::create_show(&server, 1, 1, Utc::now().naive_utc() + Duration::days(1)).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["flash"]["status"], "success");
    assert_eq!(body["flash"]["message"], "Show was successfully listed!");
}

#[tokio::test]
async fn test_shows_listing_joins_names() {
    let server = common::test_server().await;

    common::create_venue(&server, "The Musical Hop", "San Francisco", "CA", &[]).await;
    common::create_artist(&server, "Guns N Petals", &[]).await;

    let start = NaiveDate::from_ymd_opt(2019, 5, 21)
        .unwrap()
        .and_hms_opt(21, 30, 0)
        .unwrap();
    common::create_show(&server, 1, 1, start).await;

    let listing: Value = server.get("/shows").await.json();
    let shows = listing["shows"].as_array().unwrap();
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0]["venue_id"], 1);
    assert_eq!(shows[0]["venue_name"], "The Musical Hop");
    assert_eq!(shows[0]["artist_id"], 1);
    assert_eq!(shows[0]["artist_name"], "Guns N Petals");
    assert_eq!(shows[0]["artist_image_link"], "https://images.example.com/artist.jpg");
    assert_eq!(shows[0]["start_time"], "2019-05-21T21:30:00.000Z");
}

#[tokio::test]
async fn test_show_appears_on_both_sides() {
    let server = common::test_server().await;

    common::create_venue(&server, "The Dueling Pianos Bar", "New York", "NY", &[]).await;
    common::create_artist(&server, "The Wild Sax Band", &[]).await;
    common::create_show(&server, 1, 1, Utc::now().naive_utc() + Duration::days(5)).await;

    let venue: Value = server.get("/venues/1").await.json();
    assert_eq!(venue["upcoming_shows_count"], 1);
    assert_eq!(venue["upcoming_shows"][0]["artist_name"], "The Wild Sax Band");

    let artist: Value = server.get("/artists/1").await.json();
    assert_eq!(artist["upcoming_shows_count"], 1);
    assert_eq!(artist["upcoming_shows"][0]["venue_name"], "The Dueling Pianos Bar");
    assert_eq!(
        artist["upcoming_shows"][0]["start_time"],
        venue["upcoming_shows"][0]["start_time"]
    );
}

#[tokio::test]
async fn test_past_show_is_not_upcoming() {
    let server = common::test_server().await;

    common::create_venue(&server, "The Musical Hop", "San Francisco", "CA", &[]).await;
    common::create_artist(&server, "Guns N Petals", &[]).await;
    common::create_show(&server, 1, 1, Utc::now().naive_utc() - Duration::days(400)).await;

    let venue: Value = server.get("/venues/1").await.json();
    assert_eq!(venue["past_shows_count"], 1);
    assert_eq!(venue["upcoming_shows_count"], 0);

    let listing: Value = server.get("/venues").await.json();
    assert_eq!(listing["areas"][0]["venues"][0]["num_upcoming_shows"], 0);
}

#[tokio::test]
async fn test_show_with_unknown_venue_fails() {
    let server = common::test_server().await;

    common::create_artist(&server, "Guns N Petals", &[]).await;

    let body: Value = common::create_show(&server, 42, 1, Utc::now().naive_utc())
        .await
        .json();
    assert_eq!(body["flash"]["status"], "failure");
    assert_eq!(body["flash"]["message"], "An error occurred. Show could not be listed.");

    let listing: Value = server.get("/shows").await.json();
    assert!(listing["shows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_show_with_bad_start_time_fails() {
    let server = common::test_server().await;

    common::create_venue(&server, "The Musical Hop", "San Francisco", "CA", &[]).await;
    common::create_artist(&server, "Guns N Petals", &[]).await;

    let body: Value = server
        .post("/shows/create")
        .form(&[("venue_id", "1"), ("artist_id", "1"), ("start_time", "tomorrow-ish")])
        .await
        .json();
    assert_eq!(body["flash"]["status"], "failure");

    let body: Value = server
        .post("/shows/create")
        .form(&[("venue_id", "one"), ("artist_id", "1"), ("start_time", "2035-04-01 20:00")])
        .await
        .json();
    assert_eq!(body["flash"]["status"], "failure");
}

#[tokio::test]
async fn test_show_form_lists_choices_by_name() {
    let server = common::test_server().await;

    common::create_venue(&server, "The Musical Hop", "San Francisco", "CA", &[]).await;
    common::create_venue(&server, "Park Square Live Music & Coffee", "San Francisco", "CA", &[]).await;
    common::create_artist(&server, "The Wild Sax Band", &[]).await;

    let page: Value = server.get("/shows/create").await.json();
    assert_eq!(page["form"], "show");
    assert_eq!(page["venues"][0]["id"], 2);
    assert_eq!(page["venues"][0]["name"], "Park Square Live Music & Coffee");
    assert_eq!(page["venues"][1]["name"], "The Musical Hop");
    assert_eq!(page["artists"][0]["id"], 1);
}
