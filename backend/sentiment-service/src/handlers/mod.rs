pub mod frontend;
pub mod health;
pub mod sentiment;

use crate::error::AppError;
use crate::state::AppState;
use actix_web::web;

pub use health::health_check;
pub use sentiment::{analyze, fetch_and_analyze, get_trending};

/// Register every route on the given scope. The frontend goes last since it
/// claims all paths the API does not.
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let frontend_dir = state.frontend_dir.clone();

    cfg.app_data(state)
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::Validation(format!("Invalid query: {}", err)).into()
        }))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .route("/trending", web::get().to(get_trending))
                .route("/fetch_and_analyze", web::post().to(fetch_and_analyze)),
        )
        .route("/analyze", web::post().to(analyze));

    frontend::configure(cfg, &frontend_dir);
}
