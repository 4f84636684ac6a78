use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use calgate_api_structs::dtos::PublicHolidayDTO;
use calgate_api_structs::holiday::is_holiday::{APIResponse, QueryParams};
use calgate_infra::services::holidays::HolidayGetter;
use calgate_infra::Context;
use tracing::error;

pub async fn is_holiday_controller(
    query: web::Query<QueryParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, ApiError> {
    let date = query
        .date
        .unwrap_or_else(|| ctx.sys.now().with_timezone(&chrono::Local).date_naive());

    let holiday = ctx
        .holidays
        .is_holiday(&ctx.config.default_country, date)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to check holiday");
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(APIResponse {
        is_holiday: holiday.is_some(),
        queried_date: date.format("%Y-%m-%d").to_string(),
        holiday: holiday.map(PublicHolidayDTO::new),
    }))
}
