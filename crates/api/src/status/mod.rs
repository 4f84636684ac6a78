use actix_web::{web, HttpResponse};
use calgate_api_structs::status::get_status::APIResponse;

async fn status() -> HttpResponse {
    HttpResponse::Ok().json(APIResponse {
        message: "ok".into(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status));
}
