// Shared test utilities for integration tests
#![allow(dead_code)]

use axum_test::{TestResponse, TestServer};
use chrono::NaiveDateTime;
use gigbook_db::{AppState, DatabaseConfig};
use gigbook_migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Router over a freshly migrated in-memory database.
pub async fn test_server() -> TestServer {
    test_server_with_db().await.0
}

/// Like [`test_server`], also handing back the connection the router uses so
/// a test can tamper with the schema underneath it.
pub async fn test_server_with_db() -> (TestServer, DatabaseConnection) {
    let db = gigbook_db::connect(&DatabaseConfig::in_memory())
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");

    let state = Arc::new(AppState { db: db.clone() });
    let server =
        TestServer::new(gigbook_server::router(state)).expect("failed to start test server");
    (server, db)
}

pub async fn create_venue(
    server: &TestServer,
    name: &str,
    city: &str,
    state: &str,
    genres: &[&str],
) -> TestResponse {
    let mut form: Vec<(&str, String)> = vec![
        ("name", name.to_string()),
        ("city", city.to_string()),
        ("state", state.to_string()),
        ("address", "1015 Folsom Street".to_string()),
        ("phone", "123-123-1234".to_string()),
        ("image_link", format!("https://images.example.com/{}.jpg", name.len())),
        ("website_link", "https://www.themusicalhop.com".to_string()),
        ("seeking_talent", "y".to_string()),
        ("seeking_description", "Looking for a local artist".to_string()),
    ];
    form.extend(genres.iter().map(|g| ("genres", g.to_string())));

    server.post("/venues/create").form(&form).await
}

pub async fn create_artist(server: &TestServer, name: &str, genres: &[&str]) -> TestResponse {
    let mut form: Vec<(&str, String)> = vec![
        ("name", name.to_string()),
        ("city", "San Francisco".to_string()),
        ("state", "CA".to_string()),
        ("phone", "326-123-5000".to_string()),
        ("image_link", "https://images.example.com/artist.jpg".to_string()),
        ("facebook_link", "https://www.facebook.com/GunsNPetals".to_string()),
    ];
    form.extend(genres.iter().map(|g| ("genres", g.to_string())));

    server.post("/artists/create").form(&form).await
}

pub async fn create_show(
    server: &TestServer,
    venue_id: i32,
    artist_id: i32,
    start_time: NaiveDateTime,
) -> TestResponse {
    let form = [
        ("venue_id", venue_id.to_string()),
        ("artist_id", artist_id.to_string()),
        ("start_time", start_time.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];

    server.post("/shows/create").form(&form).await
}
