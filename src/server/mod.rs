// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod auth;
pub mod documents;
pub mod reviews;
pub mod sessions;
pub mod state;
pub mod stats;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::server::state::ServerState;

/// An [`ErrorReport`] at the HTTP boundary. Converts the error taxonomy
/// into status codes and a `{"detail": ...}` body.
pub struct ApiError(ErrorReport);

impl From<ErrorReport> for ApiError {
    fn from(e: ErrorReport) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {}", self.0);
        } else {
            log::debug!("request rejected: {}", self.0);
        }
        (status, Json(json!({ "detail": self.0.message() }))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/api/documents",
            post(documents::create_document).get(documents::list_documents),
        )
        .route("/api/documents/{id}", delete(documents::delete_document))
        .route(
            "/api/documents/{id}/category",
            put(documents::update_category),
        )
        .route("/api/documents/{id}/cards", post(reviews::create_card))
        .route(
            "/api/documents/{id}/chat",
            post(documents::add_chat_message).get(documents::chat_log),
        )
        .route("/api/cards/due", get(reviews::due_cards))
        .route("/api/cards/{id}/review", post(reviews::grade_review))
        .route("/api/analytics/session/start", post(sessions::start_session))
        .route("/api/analytics/session/end", post(sessions::end_session))
        .route("/api/analytics/stats", get(stats::get_stats))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn serve(config: Config) -> Fallible<()> {
    let db = Database::new(&config.database)?;
    let bind = config.bind.clone();
    let state = ServerState::new(config, db);
    let app = router(state);
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn not_found_handler() -> ApiError {
    ApiError(ErrorReport::not_found("no such route"))
}
