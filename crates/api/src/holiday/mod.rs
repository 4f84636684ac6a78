mod get_holiday;
mod is_holiday;
mod number_of_work_days;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/holidays",
        web::get().to(get_holiday::get_holiday_controller),
    );
    cfg.route(
        "/holidays/check",
        web::get().to(is_holiday::is_holiday_controller),
    );
    cfg.route(
        "/holidays/workdays",
        web::get().to(number_of_work_days::number_of_work_days_controller),
    );
}
