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

use axum::Json;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::error::ErrorReport;
use crate::server::ApiError;
use crate::server::ApiResult;
use crate::server::state::ServerState;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    username: String,
}

pub async fn login(
    State(state): State<ServerState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    match state.config.credential_for(&request.username) {
        Some(password) if password == request.password => {
            let token = state.tokens.issue(&request.username, Timestamp::now());
            log::debug!("Login: {}", request.username);
            Ok(Json(LoginResponse {
                token,
                username: request.username,
            }))
        }
        _ => Err(ErrorReport::unauthorized("invalid username or password").into()),
    }
}

pub async fn logout(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Value> {
    if let Some(token) = bearer_token(&headers) {
        state.tokens.revoke(token);
    }
    Ok(Json(json!({ "message": "logged out" })))
}

pub async fn me(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Value> {
    let username = bearer_token(&headers)
        .and_then(|token| state.tokens.lookup(token, Timestamp::now()))
        .ok_or_else(|| ErrorReport::unauthorized("invalid or expired session"))?;
    Ok(Json(json!({ "username": username })))
}

/// Middleware guarding everything except login: the request must carry a
/// live bearer token.
pub async fn require_auth(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = bearer_token(request.headers())
        .and_then(|token| state.tokens.lookup(token, Timestamp::now()));
    match authorized {
        Some(_) => next.run(request).await,
        None => ApiError::from(ErrorReport::unauthorized("invalid or expired session"))
            .into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}
