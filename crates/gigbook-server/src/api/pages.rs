use axum::Json;
use serde::Serialize;

use crate::flash::Flash;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub flash: Option<Flash>,
}

impl HomePage {
    pub fn with_flash(flash: Flash) -> Self {
        Self { flash: Some(flash) }
    }
}

/// Where a delete request leaves the user: back on the index, with a flash.
#[derive(Debug, Serialize)]
pub struct IndexOutcome {
    pub redirect_to: &'static str,
    pub flash: Flash,
}

impl IndexOutcome {
    pub fn new(flash: Flash) -> Self {
        Self {
            redirect_to: "/",
            flash,
        }
    }
}

#[derive(Serialize)]
pub struct ApiStatus {
    status: &'static str,
    version: &'static str,
}

/// GET /
pub async fn home() -> Json<HomePage> {
    Json(HomePage { flash: None })
}

/// GET /healthz
pub async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
