pub mod list_calendars;

use actix_web::web;

pub use list_calendars::ListCalendarsUseCase;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/calendars",
        web::get().to(list_calendars::list_calendars_controller),
    );
}
