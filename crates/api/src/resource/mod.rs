mod delete_resource_calendar;
mod list_resource_calendars;
mod store_resource_calendar;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/resources",
        web::post().to(store_resource_calendar::store_resource_calendar_controller),
    );
    cfg.route(
        "/resources",
        web::get().to(list_resource_calendars::list_resource_calendars_controller),
    );
    cfg.route(
        "/resources/{name}",
        web::delete().to(delete_resource_calendar::delete_resource_calendar_controller),
    );
}
