// src/api/handlers.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::*;
use crate::capture::{CaptureRequest, CaptureWorkflow};
use crate::config::CONFIG;
use crate::state::{AppState, InFlightCapture};
use crate::transfer::{FileExportItem, ImportPolicy};
use crate::vault::VaultPath;

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ----- Tree -----

pub async fn get_tree_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

pub async fn clear_tree_handler(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    state.store.clear().await?;
    Ok(Json(StatsResponse {
        artifacts: 0,
        folders: 0,
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        artifacts: state.store.count_artifacts().await,
        folders: state.store.count_folders().await,
    })
}

// ----- Folders -----

pub async fn list_folders_handler(State(state): State<AppState>) -> Json<FoldersResponse> {
    let folders = state
        .store
        .folder_paths()
        .await
        .iter()
        .map(|p| p.to_string_with_trailing_slash())
        .collect();
    Json(FoldersResponse { folders })
}

pub async fn create_folder_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateFolderRequest>,
) -> ApiResult<Json<FoldersResponse>> {
    if request.path.is_root() {
        return Err(ApiError::bad_request("the root folder always exists"));
    }
    state.store.create_folder(&request.path).await?;
    Ok(list_folders_handler(State(state)).await)
}

// ----- Files -----

/// Split a full artifact path like `src/lib/x.js` into its folder path
/// and filename.
fn split_file_path(raw: &str) -> ApiResult<(VaultPath, String)> {
    let mut segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    let Some(name) = segments.pop() else {
        return Err(ApiError::bad_request("file path must include a filename"));
    };
    let path = VaultPath::from_segments(segments.iter().map(|s| s.to_string()))
        .map_err(ApiError::from)?;
    Ok((path, name.to_string()))
}

pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<FileResponse>> {
    let (path, name) = split_file_path(&raw)?;
    let artifact = state.store.get_artifact(&path, &name).await?;
    Ok(Json(FileResponse {
        path: path.join(&name),
        content: artifact.content,
        last_modified: artifact.last_modified,
    }))
}

pub async fn put_file_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(request): Json<PutFileRequest>,
) -> ApiResult<Json<FileResponse>> {
    let (path, name) = split_file_path(&raw)?;
    state.store.put(&path, &name, &request.content).await?;
    get_file_handler(State(state), Path(raw)).await
}

pub async fn delete_file_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let (path, name) = split_file_path(&raw)?;
    state.store.delete(&path, &name).await?;
    Ok(Json(json!({ "deleted": path.join(&name) })))
}

// ----- Capture -----

pub async fn capture_handler(
    State(state): State<AppState>,
    Json(request): Json<CaptureRequest>,
) -> ApiResult<Json<CaptureResponse>> {
    let (workflow, step) = CaptureWorkflow::begin(
        state.store.clone(),
        state.oracle.clone(),
        &state.locks,
        request,
    )
    .await?;
    let id = state.register_workflow(workflow).await;
    Ok(Json(CaptureResponse { id, step }))
}

pub async fn disposition_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DispositionRequest>,
) -> ApiResult<Json<CaptureResponse>> {
    // Take the workflow out of the registry so the map lock is not held
    // across the (possibly slow) oracle call.
    let Some(mut in_flight) = state.workflows.lock().await.remove(&id) else {
        return Err(ApiError::not_found("no capture workflow with that id"));
    };

    let result = match request.action.as_disposition() {
        Some(disposition) => {
            in_flight
                .workflow
                .resolve(state.oracle.clone(), disposition)
                .await
        }
        None => match request.action {
            DispositionAction::ConfirmLoss => in_flight.workflow.confirm_loss().await,
            DispositionAction::ConfirmOverwrite => in_flight.workflow.confirm_overwrite().await,
            _ => unreachable!("as_disposition covered the other actions"),
        },
    };

    if !in_flight.workflow.is_terminal() {
        state.workflows.lock().await.insert(id, in_flight);
    }
    Ok(Json(CaptureResponse { id, step: result? }))
}

// ----- Move -----

pub async fn move_handler(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .mover
        .move_artifact(&request.from, &request.name, &request.to)
        .await?;
    Ok(Json(json!({ "moved": request.to.join(&request.name) })))
}

// ----- Import / export -----

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    #[serde(default = "default_policy")]
    pub policy: ImportPolicy,
}

fn default_policy() -> ImportPolicy {
    ImportPolicy::Merge
}

pub async fn import_handler(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<axum::response::Response> {
    match request {
        ImportRequest::Batch { entries } => {
            let imported = state.transfer.import_batch(entries).await?;
            Ok(Json(BatchImportResponse { imported }).into_response())
        }
        ImportRequest::Document(raw) => {
            let summary = state.transfer.import_document(raw, query.policy).await?;
            Ok(Json(summary).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_export_name")]
    pub name: String,
}

fn default_export_name() -> String {
    "vault".to_string()
}

pub async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    Json(state.transfer.export_document(&query.name).await)
}

pub async fn export_files_handler(State(state): State<AppState>) -> Json<Vec<FileExportItem>> {
    let mut rx = state.transfer.export_files(CONFIG.export_pacing()).await;
    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    Json(items)
}
