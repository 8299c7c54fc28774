// src/api/mod.rs

pub mod error;
pub mod handlers;
pub mod types;

pub use error::{ApiError, ApiResult};

use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// The full HTTP surface. Separate from server startup so tests can
/// drive it with `tower::ServiceExt::oneshot`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/tree",
            get(handlers::get_tree_handler).delete(handlers::clear_tree_handler),
        )
        .route("/stats", get(handlers::stats_handler))
        .route(
            "/folders",
            get(handlers::list_folders_handler).post(handlers::create_folder_handler),
        )
        .route(
            "/files/{*path}",
            get(handlers::get_file_handler)
                .put(handlers::put_file_handler)
                .delete(handlers::delete_file_handler),
        )
        .route("/capture", post(handlers::capture_handler))
        .route("/capture/{id}/disposition", post(handlers::disposition_handler))
        .route("/move", post(handlers::move_handler))
        .route("/import", post(handlers::import_handler))
        .route("/export", get(handlers::export_handler))
        .route("/export/files", get(handlers::export_files_handler))
        .with_state(state)
}
