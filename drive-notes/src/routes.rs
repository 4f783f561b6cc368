//! Axum route handlers: raw note file routes plus the workspace API.

use crate::controller::{Controller, ControllerError};
use crate::store::NoteStore;
use crate::view::ViewQuery;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use drive_notes_types::*;
use serde::Serialize;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn NoteStore>,
    pub controller: Controller,
}

impl AppState {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            controller: Controller::new(store.clone()),
            store,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route(
            "/api/notes/:id",
            get(read_note)
                .put(update_note)
                .patch(rename_note)
                .delete(delete_note),
        )
        .route("/api/workspace", get(snapshot))
        .route("/api/workspace/refresh", post(refresh))
        .route("/api/workspace/view", get(view))
        .route("/api/workspace/config", get(config))
        .route("/api/workspace/categories", post(add_category))
        .route("/api/workspace/notes", post(new_note))
        .route("/api/workspace/notes/:id", axum::routing::delete(remove_note))
        .route("/api/workspace/notes/:id/open", post(open_note))
        .route("/api/workspace/notes/:id/activate", post(activate_note))
        .route("/api/workspace/notes/:id/buffer", put(edit_buffer))
        .route("/api/workspace/notes/:id/save", post(save_note))
        .route("/api/workspace/notes/:id/close", post(close_note))
        .route("/api/workspace/notes/:id/rename", post(rename_workspace_note))
        .route("/api/workspace/notes/:id/pin", post(toggle_pin))
        .route("/api/workspace/notes/:id/archive", post(toggle_archive))
        .route("/api/workspace/notes/:id/category", put(move_to_category))
        .with_state(state)
}

// --- Raw note routes ---

fn raw_error(e: String) -> Response {
    log::error!("{}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: e }),
    )
        .into_response()
}

fn raw_result(result: Result<(), String>) -> Response {
    match result {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => raw_error(e),
    }
}

// GET /api/notes
async fn list_notes(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_notes().await {
        Ok(notes) => Json(notes).into_response(),
        Err(e) => raw_error(e),
    }
}

// POST /api/notes
async fn create_note(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNoteRequest>,
) -> Response {
    let name = req.name.filter(|n| !n.is_empty()).unwrap_or_else(|| "Untitled.txt".to_string());
    let content = req.content.unwrap_or_default();

    match state.store.create_note(&name, &content).await {
        Ok(note) => Json(note).into_response(),
        Err(e) => raw_error(e),
    }
}

// GET /api/notes/:id
async fn read_note(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.read_content(&id).await {
        Ok(content) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(e) => raw_error(e),
    }
}

// PUT /api/notes/:id
async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateContentRequest>,
) -> Response {
    raw_result(state.store.update_content(&id, &req.content).await)
}

// PATCH /api/notes/:id
async fn rename_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Response {
    raw_result(state.store.rename_note(&id, &req.name).await)
}

// DELETE /api/notes/:id
async fn delete_note(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    raw_result(state.store.delete_note(&id).await)
}

// --- Workspace routes ---

type RpcReply<T> = (StatusCode, Json<RpcResponse<T>>);

fn status_for(err: &ControllerError) -> StatusCode {
    match err {
        ControllerError::Invalid(_) => StatusCode::BAD_REQUEST,
        ControllerError::NotFound(_) => StatusCode::NOT_FOUND,
        ControllerError::Stale(_) => StatusCode::CONFLICT,
        ControllerError::Remote(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reply<T: Serialize>(result: Result<T, ControllerError>) -> RpcReply<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(RpcResponse::ok(data))),
        Err(e) => (status_for(&e), Json(RpcResponse::err(e.to_string()))),
    }
}

// GET /api/workspace
async fn snapshot(State(state): State<Arc<AppState>>) -> RpcReply<WorkspaceSnapshot> {
    reply(Ok(state.controller.snapshot()))
}

// POST /api/workspace/refresh
async fn refresh(State(state): State<Arc<AppState>>) -> RpcReply<WorkspaceSnapshot> {
    let result = state.controller.refresh().await;
    reply(result.map(|_| state.controller.snapshot()))
}

// GET /api/workspace/view
async fn view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> RpcReply<Vec<Note>> {
    reply(Ok(state.controller.view(&ViewQuery::from(params))))
}

// GET /api/workspace/config
async fn config(State(state): State<Arc<AppState>>) -> RpcReply<MasterConfig> {
    reply(Ok(state.controller.config()))
}

// POST /api/workspace/categories
async fn add_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddCategoryRequest>,
) -> RpcReply<String> {
    reply(state.controller.add_category(&req.name).await)
}

// POST /api/workspace/notes?extension=md
async fn new_note(
    State(state): State<Arc<AppState>>,
    Query(req): Query<NewNoteRequest>,
) -> RpcReply<Note> {
    reply(state.controller.create_note(req.extension).await)
}

// DELETE /api/workspace/notes/:id
async fn remove_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<String> {
    reply(state.controller.delete_note(&id).await.map(|_| id))
}

// POST /api/workspace/notes/:id/open
async fn open_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<OpenNote> {
    reply(state.controller.open_note(&id).await)
}

// POST /api/workspace/notes/:id/activate
async fn activate_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<OpenNote> {
    reply(state.controller.activate(&id))
}

// PUT /api/workspace/notes/:id/buffer
async fn edit_buffer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BufferEditRequest>,
) -> RpcReply<OpenNote> {
    reply(state.controller.edit_buffer(&id, req.content, req.name))
}

// POST /api/workspace/notes/:id/save
async fn save_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<OpenNote> {
    reply(state.controller.save_note(&id).await)
}

// POST /api/workspace/notes/:id/close
async fn close_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<Option<String>> {
    reply(state.controller.close_note(&id))
}

// POST /api/workspace/notes/:id/rename
async fn rename_workspace_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> RpcReply<String> {
    reply(state.controller.rename_note(&id, &req.name).await)
}

// POST /api/workspace/notes/:id/pin
async fn toggle_pin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<ToggleResult> {
    reply(state.controller.toggle_pin(&id).await)
}

// POST /api/workspace/notes/:id/archive
async fn toggle_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> RpcReply<ToggleResult> {
    reply(state.controller.toggle_archive(&id).await)
}

// PUT /api/workspace/notes/:id/category
async fn move_to_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MoveCategoryRequest>,
) -> RpcReply<MasterConfig> {
    reply(
        state
            .controller
            .move_to_category(&id, req.category.as_deref())
            .await,
    )
}
