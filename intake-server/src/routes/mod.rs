use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};

mod health;
mod keys;
mod predict;
mod records;
mod register;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/public-key", get(keys::public_key))
        .route("/register", post(register::register))
        .route("/api/records", get(records::list_records))
        .route(
            "/api/records/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/api/predict_all", post(predict::predict_all));

    let pages = match &state.config.static_dir {
        Some(dir) => Router::new()
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .route_service("/admin", ServeFile::new(dir.join("admin.html"))),
        None => Router::new(),
    };

    Router::new()
        .merge(api)
        .merge(pages)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
