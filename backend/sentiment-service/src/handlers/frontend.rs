//! Single-page frontend: real files when they exist, `index.html` for every
//! other path, and a plain JSON notice when no build is present.
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::path::Path;

const INDEX_FILE: &str = "index.html";

pub fn configure(cfg: &mut web::ServiceConfig, frontend_dir: &Path) {
    let index = frontend_dir.join(INDEX_FILE);
    if !index.is_file() {
        tracing::warn!(
            dir = %frontend_dir.display(),
            "No frontend build found, serving API only"
        );
        cfg.default_service(web::to(api_running));
        return;
    }

    tracing::info!(dir = %frontend_dir.display(), "Serving frontend");
    cfg.service(
        Files::new("/", frontend_dir)
            .index_file(INDEX_FILE)
            .default_handler(fn_service(move |req: ServiceRequest| {
                let index = index.clone();
                async move {
                    let (req, _) = req.into_parts();
                    let file = NamedFile::open_async(&index).await?;
                    let res = file.into_response(&req);
                    Ok(ServiceResponse::new(req, res))
                }
            })),
    );
}

async fn api_running() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Sentiment API is running!" }))
}
