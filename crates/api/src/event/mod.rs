pub mod create_event;
pub mod delete_event;
pub mod list_events;
pub mod move_event;
pub mod update_event;

use actix_web::web;

pub use create_event::CreateEventUseCase;
pub use delete_event::DeleteEventUseCase;
pub use list_events::ListEventsUseCase;
pub use move_event::MoveEventUseCase;
pub use update_event::UpdateEventUseCase;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/events/query",
        web::post().to(list_events::list_events_controller),
    );
    cfg.route(
        "/events/move",
        web::post().to(move_event::move_event_controller),
    );
    cfg.route(
        "/calendars/{calendar_id}/events",
        web::post().to(create_event::create_event_controller),
    );
    cfg.route(
        "/calendars/{calendar_id}/events/{event_id}",
        web::put().to(update_event::update_event_controller),
    );
    cfg.route(
        "/calendars/{calendar_id}/events/{event_id}",
        web::delete().to(delete_event::delete_event_controller),
    );
}
