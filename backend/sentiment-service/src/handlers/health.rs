use crate::models::HealthResponse;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder};

/// Liveness plus whether the model loaded
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        model: if state.model.is_ready() {
            "ready"
        } else {
            "unavailable"
        },
    })
}
