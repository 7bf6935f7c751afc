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
use axum::extract::Path;
use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::db::ChatMessage;
use crate::db::Document;
use crate::db::DocumentId;
use crate::error::ErrorReport;
use crate::server::ApiResult;
use crate::server::state::ServerState;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
pub struct CreateDocument {
    filename: String,
    #[serde(default = "default_category")]
    category: String,
    summary: Option<String>,
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

pub async fn create_document(
    State(state): State<ServerState>,
    Json(request): Json<CreateDocument>,
) -> ApiResult<Document> {
    if request.filename.trim().is_empty() {
        return Err(ErrorReport::invalid_argument("filename must not be empty").into());
    }
    let id = state.db.add_document(
        &request.filename,
        &request.category,
        request.summary.as_deref(),
        Timestamp::now(),
    )?;
    Ok(Json(state.db.get_document(id)?))
}

pub async fn list_documents(State(state): State<ServerState>) -> ApiResult<Vec<Document>> {
    Ok(Json(state.db.list_documents()?))
}

#[derive(Deserialize)]
pub struct UpdateCategory {
    category: String,
}

pub async fn update_category(
    State(state): State<ServerState>,
    Path(id): Path<DocumentId>,
    Json(request): Json<UpdateCategory>,
) -> ApiResult<Document> {
    if request.category.trim().is_empty() {
        return Err(ErrorReport::invalid_argument("category must not be empty").into());
    }
    state.db.update_document_category(id, &request.category)?;
    Ok(Json(state.db.get_document(id)?))
}

pub async fn delete_document(
    State(state): State<ServerState>,
    Path(id): Path<DocumentId>,
) -> ApiResult<Value> {
    state.db.delete_document(id)?;
    Ok(Json(json!({ "deleted": id })))
}

#[derive(Deserialize)]
pub struct AddChatMessage {
    role: String,
    content: String,
}

pub async fn add_chat_message(
    State(state): State<ServerState>,
    Path(id): Path<DocumentId>,
    Json(request): Json<AddChatMessage>,
) -> ApiResult<ChatMessage> {
    if request.role != "user" && request.role != "assistant" {
        return Err(ErrorReport::invalid_argument(format!(
            "unknown chat role: {}",
            request.role
        ))
        .into());
    }
    let document = state.db.get_document(id)?;
    let now = Timestamp::now();
    let message_id = state
        .db
        .add_chat_message(document.id, &request.role, &request.content, now)?;
    Ok(Json(ChatMessage {
        id: message_id,
        document_id: document.id,
        role: request.role,
        content: request.content,
        sent_at: now,
    }))
}

pub async fn chat_log(
    State(state): State<ServerState>,
    Path(id): Path<DocumentId>,
) -> ApiResult<Vec<ChatMessage>> {
    // 404 on unknown documents, not an empty log.
    let document = state.db.get_document(id)?;
    Ok(Json(state.db.chat_log(document.id)?))
}
